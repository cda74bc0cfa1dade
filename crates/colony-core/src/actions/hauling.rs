//! Hauling Actions
//!
//! Reserve a stockpiled item, walk to it, carry it off, and release the
//! reservation if the goal winds down without finishing. The
//! cancellation action at the end of a hauling goal is deliberately
//! non-interruptible so a preempting goal can never leave a dangling
//! reservation behind.

use colony_messages::Message;
use serde_json::{json, Value};
use tracing::debug;

use crate::bus::BusReply;
use crate::error::CoreError;
use crate::goals::assigned::GoalState;
use crate::goals::persistence::SaveLookup;

use super::{
    expect_state_object, sparse_state, state_f32, Action, ActionContext, CompletionResult,
};

/// Reserves the next available stockpile item for hauling.
#[derive(Default)]
pub struct RequestHaulingAllocationAction {
    result: Option<CompletionResult>,
}

impl RequestHaulingAllocationAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Action for RequestHaulingAllocationAction {
    fn name(&self) -> &'static str {
        "request_hauling_allocation"
    }

    fn update(&mut self, _delta: f32, goal: &mut GoalState, ctx: &mut ActionContext) {
        let Some(item) = ctx.bus.hauling.peek_available().cloned() else {
            debug!(agent = %ctx.agent, "nothing in the stockpiles to haul");
            self.result = Some(CompletionResult::Failure);
            return;
        };

        let reply = ctx.bus.dispatch(Message::RequestHaulingAllocation {
            agent: ctx.agent.clone(),
            origin_location: item.location,
            item_type: item.item_type,
            material: item.material,
        });

        match reply {
            BusReply::HaulingAllocated(Some(allocation)) => {
                goal.target_location = Some(allocation.origin_location.clone());
                goal.hauling_allocation = Some(allocation);
                self.result = Some(CompletionResult::Success);
            }
            _ => {
                // Someone else reserved it between peek and dispatch.
                self.result = Some(CompletionResult::Failure);
            }
        }
    }

    fn completion(&self) -> Option<CompletionResult> {
        self.result
    }

    fn set_completion(&mut self, result: Option<CompletionResult>) {
        self.result = result;
    }
}

/// Picks up the reserved item at its stockpile location.
#[derive(Default)]
pub struct PickUpHauledItemAction {
    elapsed: f32,
    result: Option<CompletionResult>,
}

impl PickUpHauledItemAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Action for PickUpHauledItemAction {
    fn name(&self) -> &'static str {
        "pick_up_hauled_item"
    }

    fn is_applicable(&self, goal: &GoalState, _ctx: &ActionContext) -> bool {
        goal.hauling_allocation.is_some()
    }

    fn update(&mut self, delta: f32, goal: &mut GoalState, ctx: &mut ActionContext) {
        self.elapsed += delta;
        if self.elapsed < ctx.config.hauling.pickup_seconds {
            return;
        }

        let Some(allocation) = goal.hauling_allocation.take() else {
            self.result = Some(CompletionResult::Failure);
            return;
        };

        ctx.inventory.carried.push(allocation.item_type.clone());
        ctx.bus.dispatch(Message::EntityDestroyed {
            entity: format!("stock_{}", allocation.id),
        });
        ctx.bus.consume_hauling_allocation(&allocation.id);
        debug!(agent = %ctx.agent, item = %allocation.item_type, "picked up hauled item");
        self.result = Some(CompletionResult::Success);
    }

    fn completion(&self) -> Option<CompletionResult> {
        self.result
    }

    fn set_completion(&mut self, result: Option<CompletionResult>) {
        self.result = result;
    }

    fn write_state(&self) -> Value {
        let mut fields = Vec::new();
        if self.elapsed > 0.0 {
            fields.push(("elapsed_seconds", json!(self.elapsed)));
        }
        sparse_state(fields)
    }

    fn read_state(&mut self, state: &Value, _refs: &SaveLookup) -> Result<(), CoreError> {
        expect_state_object(self.name(), state)?;
        self.elapsed = state_f32(state, "elapsed_seconds", 0.0);
        Ok(())
    }
}

/// Releases a still-held hauling reservation. Runs at the tail of a
/// hauling goal so teardown happens even when earlier steps failed.
#[derive(Default)]
pub struct CancelHaulingAllocationAction {
    result: Option<CompletionResult>,
}

impl CancelHaulingAllocationAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Action for CancelHaulingAllocationAction {
    fn name(&self) -> &'static str {
        "cancel_hauling_allocation"
    }

    fn update(&mut self, _delta: f32, goal: &mut GoalState, ctx: &mut ActionContext) {
        if let Some(allocation) = goal.hauling_allocation.take() {
            ctx.bus.dispatch(Message::CancelHaulingAllocation {
                allocation: allocation.id,
            });
        }
        self.result = Some(CompletionResult::Success);
    }

    fn completion(&self) -> Option<CompletionResult> {
        self.result
    }

    fn set_completion(&mut self, result: Option<CompletionResult>) {
        self.result = result;
    }

    fn is_interruptible(&self) -> bool {
        false
    }
}
