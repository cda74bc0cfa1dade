//! Sleep Action
//!
//! The canonical stateful-interruption example: a sleeping agent cannot
//! just vanish from bed when something preempts the goal, so the
//! interruption hook stands the agent up and vacates the bed before the
//! failure result is recorded.

use colony_messages::Message;
use serde_json::{json, Value};
use tracing::debug;

use crate::components::Needs;
use crate::error::CoreError;
use crate::goals::assigned::GoalState;
use crate::goals::persistence::SaveLookup;

use super::{
    expect_state_object, sparse_state, state_bool, state_f32, Action, ActionContext,
    CompletionResult,
};

/// Sleeps until rest recovers past the configured wake threshold.
#[derive(Default)]
pub struct SleepAction {
    asleep: bool,
    slept_seconds: f32,
    result: Option<CompletionResult>,
}

impl SleepAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compensating teardown shared by natural wake and interruption.
    fn stand_up(&mut self, goal: &mut GoalState, ctx: &mut ActionContext) {
        if !self.asleep {
            return;
        }
        self.asleep = false;
        if let Some(furniture) = goal.assigned_furniture.take() {
            // The vacated bed needs its visual state refreshed.
            ctx.bus.dispatch(Message::AssetUpdateRequired { furniture });
        }
    }
}

impl Action for SleepAction {
    fn name(&self) -> &'static str {
        "sleep"
    }

    fn update(&mut self, delta: f32, goal: &mut GoalState, ctx: &mut ActionContext) {
        if !self.asleep {
            self.asleep = true;
            if let Some(furniture) = &goal.assigned_furniture {
                ctx.bus.dispatch(Message::AssetUpdateRequired {
                    furniture: furniture.clone(),
                });
            }
        }

        self.slept_seconds += delta;
        let restored = ctx.config.sleep.rest_restored_per_hour * delta / 3600.0;
        Needs::restore(&mut ctx.needs.rest, restored);

        if ctx.needs.rest >= ctx.config.sleep.wake_threshold {
            debug!(agent = %ctx.agent, slept = self.slept_seconds, "woke up rested");
            self.stand_up(goal, ctx);
            self.result = Some(CompletionResult::Success);
        }
    }

    fn completion(&self) -> Option<CompletionResult> {
        self.result
    }

    fn set_completion(&mut self, result: Option<CompletionResult>) {
        self.result = result;
    }

    fn interrupted(&mut self, goal: &mut GoalState, ctx: &mut ActionContext) {
        self.stand_up(goal, ctx);
        self.result = Some(CompletionResult::Failure);
    }

    fn write_state(&self) -> Value {
        let mut fields = Vec::new();
        if self.asleep {
            fields.push(("asleep", json!(true)));
        }
        if self.slept_seconds > 0.0 {
            fields.push(("slept_seconds", json!(self.slept_seconds)));
        }
        sparse_state(fields)
    }

    fn read_state(&mut self, state: &Value, _refs: &SaveLookup) -> Result<(), CoreError> {
        expect_state_object(self.name(), state)?;
        self.asleep = state_bool(state, "asleep", false);
        self.slept_seconds = state_f32(state, "slept_seconds", 0.0);
        Ok(())
    }
}
