//! Travel Action
//!
//! Walks the agent to the goal's target location. Navigation internals are
//! out of scope, so travel is one timed leg; the interesting part is that
//! the elapsed counter survives preemption, so a walk interrupted by
//! higher-priority work resumes where it left off instead of restarting.

use serde_json::{json, Value};

use crate::error::CoreError;
use crate::goals::assigned::GoalState;
use crate::goals::persistence::SaveLookup;

use super::{expect_state_object, sparse_state, state_f32, Action, ActionContext, CompletionResult};

/// Multi-tick walk toward `goal.target_location`.
#[derive(Default)]
pub struct GoToLocationAction {
    elapsed: f32,
    result: Option<CompletionResult>,
}

impl GoToLocationAction {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed
    }
}

impl Action for GoToLocationAction {
    fn name(&self) -> &'static str {
        "go_to_location"
    }

    fn is_applicable(&self, goal: &GoalState, _ctx: &ActionContext) -> bool {
        goal.target_location.is_some()
    }

    fn update(&mut self, delta: f32, goal: &mut GoalState, ctx: &mut ActionContext) {
        let Some(target) = goal.target_location.clone() else {
            self.result = Some(CompletionResult::Failure);
            return;
        };

        self.elapsed += delta;
        if self.elapsed >= ctx.config.travel.seconds_per_leg {
            ctx.position.location_id = target;
            self.result = Some(CompletionResult::Success);
        }
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
