//! Actions
//!
//! The leaf unit of the execution model: one interruptible step of a goal,
//! advanced once per tick while it sits at the front of its goal's queue.
//!
//! An action stores its own completion result; `None` means in progress and
//! the result is set exactly once per activation. Abandoning the whole goal
//! in favour of a specific other goal is expressed through
//! [`ActionPoll::SwitchGoal`], an ordinary return value the executor
//! propagates, not an unwind.

pub mod combat;
pub mod context;
pub mod hauling;
pub mod job;
pub mod liquid;
pub mod registry;
pub mod sleep;
pub mod travel;

use colony_messages::GoalId;
use serde_json::Value;

use crate::error::CoreError;
use crate::goals::assigned::GoalState;
use crate::goals::persistence::SaveLookup;

pub use combat::AttackTargetAction;
pub use context::ActionContext;
pub use hauling::{
    CancelHaulingAllocationAction, PickUpHauledItemAction, RequestHaulingAllocationAction,
};
pub use job::{SelectJobAction, WorkOnJobAction};
pub use liquid::{
    CancelLiquidAllocationAction, DrinkFetchedLiquidAction, RequestLiquidTransferAction,
};
pub use registry::{ActionFactory, ActionRegistry};
pub use sleep::SleepAction;
pub use travel::GoToLocationAction;

/// Outcome an action reports when it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionResult {
    Success,
    Failure,
}

/// What the executor sees after an action's tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPoll {
    /// Still running; try again next tick.
    Pending,
    /// Finished with the given result.
    Complete(CompletionResult),
    /// Abandon this goal and start the named one instead.
    SwitchGoal(GoalId),
}

/// One executable step of a goal.
pub trait Action: Send + Sync {
    /// Stable name, used as the registry and save-file key.
    fn name(&self) -> &'static str;

    /// Precondition check, re-run every tick while current. Returning false
    /// fails the action rather than letting it run on invalid state.
    fn is_applicable(&self, _goal: &GoalState, _ctx: &ActionContext) -> bool {
        true
    }

    /// Advances internal state by `delta` simulated seconds. Called at most
    /// once per tick while current and never after completion.
    fn update(&mut self, delta: f32, goal: &mut GoalState, ctx: &mut ActionContext);

    /// The stored completion result; `None` while in progress.
    fn completion(&self) -> Option<CompletionResult>;

    /// Overwrites the stored completion result. `None` re-arms a preempted
    /// action so it can resume.
    fn set_completion(&mut self, result: Option<CompletionResult>);

    /// Inspected by the queue after `update`. Overridden by actions that
    /// can redirect the agent to a different goal.
    fn poll(&self, _goal: &GoalState) -> ActionPoll {
        match self.completion() {
            None => ActionPoll::Pending,
            Some(result) => ActionPoll::Complete(result),
        }
    }

    /// Non-interruptible actions run to natural completion; interruption
    /// requests against them are rejected.
    fn is_interruptible(&self) -> bool {
        true
    }

    /// Invoked when an external event ends the action early. The default
    /// forces a failure; actions with stateful side effects override this
    /// to compensate first.
    fn interrupted(&mut self, _goal: &mut GoalState, _ctx: &mut ActionContext) {
        self.set_completion(Some(CompletionResult::Failure));
    }

    /// Serializes subclass-specific state, writing only non-default fields.
    /// Actions with nothing to save return `Null`.
    fn write_state(&self) -> Value {
        Value::Null
    }

    /// Restores subclass-specific state written by [`Action::write_state`].
    fn read_state(&mut self, _state: &Value, _refs: &SaveLookup) -> Result<(), CoreError> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name())
            .field("completion", &self.completion())
            .finish()
    }
}

/// Builds a sparse state object from the given non-default fields, or
/// `Null` when there are none.
pub(crate) fn sparse_state(fields: Vec<(&str, Value)>) -> Value {
    if fields.is_empty() {
        return Value::Null;
    }
    let map: serde_json::Map<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    Value::Object(map)
}

/// Reads an f32 field from a sparse state object, defaulting when absent.
pub(crate) fn state_f32(state: &Value, key: &str, default: f32) -> f32 {
    state
        .get(key)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .unwrap_or(default)
}

/// Reads a u64 field from a sparse state object, defaulting when absent.
pub(crate) fn state_u64(state: &Value, key: &str, default: u64) -> u64 {
    state.get(key).and_then(Value::as_u64).unwrap_or(default)
}

/// Reads a bool field from a sparse state object, defaulting when absent.
pub(crate) fn state_bool(state: &Value, key: &str, default: bool) -> bool {
    state.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Rejects state payloads that are neither absent nor an object.
pub(crate) fn expect_state_object(action: &str, state: &Value) -> Result<(), CoreError> {
    if state.is_null() || state.is_object() {
        Ok(())
    } else {
        Err(CoreError::RestoreState {
            action: action.to_string(),
            reason: format!("expected object state, found {}", state),
        })
    }
}
