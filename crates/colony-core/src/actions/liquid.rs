//! Liquid Actions
//!
//! Thirst handling: reserve a quantity at a source, walk there, drink,
//! and release the reservation if the goal never gets that far. The
//! request action reads what to fetch and in what container from
//! tuning, so the same goal works for any configured liquid.

use colony_messages::{ItemTypeId, MaterialId, Message};
use serde_json::{json, Value};
use tracing::debug;

use crate::bus::BusReply;
use crate::components::Needs;
use crate::error::CoreError;
use crate::goals::assigned::GoalState;
use crate::goals::persistence::SaveLookup;

use super::{
    expect_state_object, sparse_state, state_f32, Action, ActionContext, CompletionResult,
};

/// Reserves a configured quantity of liquid at whichever source can
/// supply it.
#[derive(Default)]
pub struct RequestLiquidTransferAction {
    result: Option<CompletionResult>,
}

impl RequestLiquidTransferAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Action for RequestLiquidTransferAction {
    fn name(&self) -> &'static str {
        "request_liquid_transfer"
    }

    fn update(&mut self, _delta: f32, goal: &mut GoalState, ctx: &mut ActionContext) {
        let reply = ctx.bus.dispatch(Message::RequestLiquidTransfer {
            agent: ctx.agent.clone(),
            material: MaterialId::new(ctx.config.liquid.material.clone()),
            amount: ctx.config.liquid.fetch_amount_litres,
            source_location: String::new(),
            target_location: ctx.position.location_id.clone(),
            container_item_type: ItemTypeId::new(ctx.config.liquid.container_item_type.clone()),
            profession: ctx.profession.map(str::to_string),
            priority: 0,
        });

        match reply {
            BusReply::LiquidAllocated(Some(allocation)) => {
                goal.target_location = Some(allocation.source_location.clone());
                goal.liquid_allocation = Some(allocation);
                self.result = Some(CompletionResult::Success);
            }
            _ => {
                debug!(agent = %ctx.agent, "no liquid source could supply the request");
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

/// Drinks the reserved liquid, restoring hunger to full.
#[derive(Default)]
pub struct DrinkFetchedLiquidAction {
    elapsed: f32,
    result: Option<CompletionResult>,
}

impl DrinkFetchedLiquidAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Action for DrinkFetchedLiquidAction {
    fn name(&self) -> &'static str {
        "drink_fetched_liquid"
    }

    fn is_applicable(&self, goal: &GoalState, _ctx: &ActionContext) -> bool {
        goal.liquid_allocation.is_some()
    }

    fn update(&mut self, delta: f32, goal: &mut GoalState, ctx: &mut ActionContext) {
        self.elapsed += delta;
        if self.elapsed < ctx.config.liquid.drink_seconds {
            return;
        }

        let Some(allocation) = goal.liquid_allocation.take() else {
            self.result = Some(CompletionResult::Failure);
            return;
        };

        Needs::restore(&mut ctx.needs.hunger, 1.0);
        ctx.bus.consume_liquid_allocation(&allocation.id);
        debug!(agent = %ctx.agent, amount = allocation.amount, "drank fetched liquid");
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

/// Releases a still-held liquid reservation at the tail of the goal.
#[derive(Default)]
pub struct CancelLiquidAllocationAction {
    result: Option<CompletionResult>,
}

impl CancelLiquidAllocationAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Action for CancelLiquidAllocationAction {
    fn name(&self) -> &'static str {
        "cancel_liquid_allocation"
    }

    fn update(&mut self, _delta: f32, goal: &mut GoalState, ctx: &mut ActionContext) {
        if let Some(allocation) = goal.liquid_allocation.take() {
            ctx.bus.dispatch(Message::CancelLiquidAllocation {
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
