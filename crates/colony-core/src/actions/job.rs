//! Job Actions
//!
//! Selecting a job from the board and working an assigned job to
//! completion. Job requests may be answered on the dispatch tick or later
//! through the mailbox; an unanswered request times out, fails the action,
//! and cancels itself so no stale offer arrives afterwards.

use colony_messages::{GoalId, Job, Message};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::CoreError;
use crate::goals::assigned::GoalState;
use crate::goals::persistence::SaveLookup;

use super::{
    expect_state_object, sparse_state, state_f32, ActionContext, ActionPoll, Action,
    CompletionResult,
};
use crate::bus::BusReply;

/// Requests a job from the board and reserves the first suitable offer.
///
/// Jobs that require a weapon are skipped while the agent cannot fight
/// (empty weapon slot, or a ranged weapon with no ammunition). Accepting a
/// job that names a `switch_to_goal` redirects the whole goal; the accepted
/// job is already stored on the goal state so the executor can carry it
/// into the replacement goal.
#[derive(Default)]
pub struct SelectJobAction {
    requested: bool,
    elapsed_wait: f32,
    switch_to: Option<GoalId>,
    result: Option<CompletionResult>,
}

impl SelectJobAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles an offer list, whether it arrived on the request tick or
    /// from the mailbox.
    fn job_callback(&mut self, offers: Vec<Job>, goal: &mut GoalState, ctx: &mut ActionContext) {
        for offer in offers {
            if !self.suits(&offer, ctx) {
                continue;
            }
            let reply = ctx.bus.dispatch(Message::AcceptJob {
                agent: ctx.agent.clone(),
                job: offer.id.clone(),
            });
            if let BusReply::JobAccepted(Some(accepted)) = reply {
                debug!(agent = %ctx.agent, job = %accepted.id, "job accepted");
                self.switch_to = accepted.switch_to_goal.clone();
                goal.assigned_job = Some(accepted);
                self.result = Some(CompletionResult::Success);
                return;
            }
            // Another agent reserved it between offer and accept; keep
            // scanning.
        }
        self.result = Some(CompletionResult::Failure);
    }

    fn suits(&self, job: &Job, ctx: &ActionContext) -> bool {
        if let Some(required) = &job.profession {
            if ctx.profession != Some(required.as_str()) {
                return false;
            }
        }
        if job.requires_weapon && !ctx.inventory.has_usable_weapon() {
            return false;
        }
        true
    }
}

impl Action for SelectJobAction {
    fn name(&self) -> &'static str {
        "select_job"
    }

    fn update(&mut self, delta: f32, goal: &mut GoalState, ctx: &mut ActionContext) {
        if !self.requested {
            self.requested = true;
            let reply = ctx.bus.dispatch(Message::RequestJob {
                agent: ctx.agent.clone(),
            });
            // Dispatch is synchronous; the reply may already be here.
            if let BusReply::JobOffers(offers) = reply {
                self.job_callback(offers, goal, ctx);
            }
            return;
        }

        if let Some(offers) = ctx.bus.take_job_offers(ctx.agent) {
            self.job_callback(offers, goal, ctx);
            return;
        }

        self.elapsed_wait += delta;
        if self.elapsed_wait >= ctx.config.goals.request_timeout_seconds {
            debug!(agent = %ctx.agent, "job request timed out");
            ctx.bus.dispatch(Message::CancelJobRequest {
                agent: ctx.agent.clone(),
            });
            self.result = Some(CompletionResult::Failure);
        }
    }

    fn completion(&self) -> Option<CompletionResult> {
        self.result
    }

    fn set_completion(&mut self, result: Option<CompletionResult>) {
        self.result = result;
    }

    fn poll(&self, _goal: &GoalState) -> ActionPoll {
        if let Some(goal_id) = &self.switch_to {
            return ActionPoll::SwitchGoal(goal_id.clone());
        }
        match self.result {
            None => ActionPoll::Pending,
            Some(result) => ActionPoll::Complete(result),
        }
    }

    // A pending board request does not survive a save; only the wait
    // budget does, so a restored action re-requests and keeps its timeout.
    fn write_state(&self) -> Value {
        let mut fields = Vec::new();
        if self.elapsed_wait > 0.0 {
            fields.push(("elapsed_wait_seconds", json!(self.elapsed_wait)));
        }
        sparse_state(fields)
    }

    fn read_state(&mut self, state: &Value, _refs: &SaveLookup) -> Result<(), CoreError> {
        expect_state_object(self.name(), state)?;
        self.elapsed_wait = state_f32(state, "elapsed_wait_seconds", 0.0);
        self.requested = false;
        Ok(())
    }
}

/// Works the assigned job for its configured duration, then reports it
/// complete.
#[derive(Default)]
pub struct WorkOnJobAction {
    elapsed: f32,
    result: Option<CompletionResult>,
}

impl WorkOnJobAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Action for WorkOnJobAction {
    fn name(&self) -> &'static str {
        "work_on_job"
    }

    fn is_applicable(&self, goal: &GoalState, _ctx: &ActionContext) -> bool {
        goal.assigned_job.is_some()
    }

    fn update(&mut self, delta: f32, goal: &mut GoalState, ctx: &mut ActionContext) {
        let Some(job) = &goal.assigned_job else {
            self.result = Some(CompletionResult::Failure);
            return;
        };

        self.elapsed += delta;
        if self.elapsed < job.work_duration {
            return;
        }

        // Taking the job out first: a completed job must not be cancelled
        // back to the board during goal teardown.
        let Some(job) = goal.assigned_job.take() else {
            self.result = Some(CompletionResult::Failure);
            return;
        };
        ctx.bus.dispatch(Message::JobCompleted {
            agent: ctx.agent.clone(),
            job: job.id.clone(),
        });
        ctx.bus.dispatch(Message::EntityCreated {
            entity: format!("product_{}", job.id),
        });
        if let Some(furniture) = job.target_furniture {
            ctx.bus.dispatch(Message::AssetUpdateRequired { furniture });
        }
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
