//! Assigned Goals
//!
//! The live, per-agent side of goal execution: an instantiated action
//! queue plus the shared scratchpad (`GoalState`) the actions hand
//! results to each other through. One agent runs at most one assigned
//! goal at a time; the executor drives it with [`AssignedGoal::advance`]
//! once per tick.

use std::sync::Arc;

use colony_messages::{
    AgentId, FurnitureId, GoalId, HaulingAllocation, Job, LiquidAllocation, Message,
};
use tracing::{debug, warn};

use crate::actions::{Action, ActionContext, ActionPoll, ActionRegistry, CompletionResult};
use crate::bus::MessageBus;
use crate::components::{AgentMemory, MemoryEntry};
use crate::error::CoreError;
use crate::goals::definition::{GoalDefinition, SelectorCondition};
use crate::goals::queue::ActionQueue;

/// Shared mutable state actions read and write while a goal runs.
/// Ownership of anything left here when the goal ends is released or
/// transferred by the executor.
#[derive(Debug, Default)]
pub struct GoalState {
    /// Job reserved by a select action, consumed by a work action.
    pub assigned_job: Option<Job>,
    /// Live hauling reservation held by this goal.
    pub hauling_allocation: Option<HaulingAllocation>,
    /// Live liquid reservation held by this goal.
    pub liquid_allocation: Option<LiquidAllocation>,
    /// Furniture claimed for the goal's duration (a bed, a workbench).
    pub assigned_furniture: Option<FurnitureId>,
    /// Where the agent should currently be heading.
    pub target_location: Option<String>,
    /// The memory entry this goal is acting on, bound at assignment so
    /// the goal keeps working the same sighting even if the agent's
    /// memory changes underneath it.
    pub relevant_memory: Option<MemoryEntry>,
    /// Set once the goal has been told to stop; a failing action then
    /// abandons the rest of the queue instead of continuing past it.
    pub interrupted: bool,
}

/// What [`AssignedGoal::advance`] reports back to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalAdvance {
    /// An action is still running or the next one is about to start.
    InProgress,
    /// The queue ran dry; the goal finished normally.
    Completed,
    /// An interrupted action failed and the rest of the queue was
    /// dropped.
    Abandoned,
    /// The current action asked to abandon this goal for another.
    Switch(GoalId),
}

/// A goal definition instantiated for one agent.
pub struct AssignedGoal {
    pub definition: Arc<GoalDefinition>,
    queue: ActionQueue,
    pub state: GoalState,
}

impl AssignedGoal {
    /// Builds the action queue from the definition. Fails if any action
    /// name is missing from the registry, which [`crate::goals::definition::GoalLibrary::validate`]
    /// should have caught at startup.
    pub fn instantiate(
        definition: Arc<GoalDefinition>,
        registry: &ActionRegistry,
    ) -> Result<Self, CoreError> {
        let mut queue = ActionQueue::new();
        for name in &definition.action_names {
            queue.push_back(registry.resolve(name)?);
        }
        Ok(Self {
            definition,
            queue,
            state: GoalState::default(),
        })
    }

    /// Reassembles a goal from restored parts. The queue holds only the
    /// actions that had not yet completed when the save was written.
    pub(crate) fn from_parts(
        definition: Arc<GoalDefinition>,
        queue: ActionQueue,
        state: GoalState,
    ) -> Self {
        Self {
            definition,
            queue,
            state,
        }
    }

    pub fn goal_id(&self) -> &GoalId {
        &self.definition.id
    }

    /// Records the memory entry that made this goal eligible, if any of
    /// its selectors match on one. No-op for goals without a memory
    /// condition.
    pub fn bind_relevant_memory(&mut self, memory: &AgentMemory) {
        let kind = self
            .definition
            .selectors
            .iter()
            .flat_map(|s| &s.conditions)
            .find_map(|c| match c {
                SelectorCondition::MemoryPresent(kind) => Some(*kind),
                _ => None,
            });
        if let Some(kind) = kind {
            self.state.relevant_memory = memory.get(kind).cloned();
        }
    }

    /// Name of the action currently at the front, if any.
    pub fn current_action_name(&self) -> Option<&'static str> {
        self.queue.current().map(|a| a.name())
    }

    pub(crate) fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub(crate) fn queue_mut(&mut self) -> &mut ActionQueue {
        &mut self.queue
    }

    /// Runs one tick of the current action and interprets its result.
    pub fn advance(&mut self, delta: f32, ctx: &mut ActionContext) -> GoalAdvance {
        let Some(current) = self.queue.current_mut() else {
            return GoalAdvance::Completed;
        };

        // A preempted-and-resumed action keeps its progress but has no
        // stored result; a freshly finished one must not run again.
        if current.completion().is_none() {
            if current.is_applicable(&self.state, ctx) {
                current.update(delta, &mut self.state, ctx);
            } else {
                debug!(
                    agent = %ctx.agent,
                    action = current.name(),
                    "action no longer applicable"
                );
                current.set_completion(Some(CompletionResult::Failure));
            }
        }

        match current.poll(&self.state) {
            ActionPoll::Pending => GoalAdvance::InProgress,
            ActionPoll::SwitchGoal(next) => {
                debug!(goal = %self.definition.id, next = %next, "goal switch requested");
                GoalAdvance::Switch(next)
            }
            ActionPoll::Complete(CompletionResult::Success) => {
                self.queue.pop_current();
                self.queue.apply_deferred();
                if self.queue.is_empty() {
                    GoalAdvance::Completed
                } else {
                    GoalAdvance::InProgress
                }
            }
            ActionPoll::Complete(CompletionResult::Failure) => {
                let failed = self.queue.pop_current();
                if self.state.interrupted {
                    if let Some(failed) = failed {
                        debug!(
                            goal = %self.definition.id,
                            action = failed.name(),
                            remaining = self.queue.len(),
                            "abandoning interrupted goal"
                        );
                    }
                    self.queue.clear();
                    GoalAdvance::Abandoned
                } else {
                    // Failure is a completion too: a push parked behind
                    // the failed action still has to run.
                    self.queue.apply_deferred();
                    if self.queue.is_empty() {
                        GoalAdvance::Completed
                    } else {
                        GoalAdvance::InProgress
                    }
                }
            }
        }
    }

    /// Preempts the current action with a more urgent one. The current
    /// action's interruption hook runs for its side effects, then its
    /// result is cleared so it resumes, progress intact, once the
    /// inserted action finishes. If the current action refuses
    /// interruption the insert is parked instead.
    pub fn push_interrupting(
        &mut self,
        action: Box<dyn Action>,
        ctx: &mut ActionContext,
    ) {
        if let Some(current) = self.queue.current_mut() {
            if !current.is_interruptible() {
                debug!(
                    agent = %ctx.agent,
                    current = current.name(),
                    inserted = action.name(),
                    "current action refuses interruption, push deferred"
                );
                self.queue.defer_front(action);
                return;
            }
            if current.completion().is_none() {
                current.interrupted(&mut self.state, ctx);
                current.set_completion(None);
            }
        }
        self.queue.push_front(action);
    }

    /// Asks the goal to stop. Returns false when the current action is
    /// non-interruptible; the goal then runs on unchanged. Otherwise the
    /// interruption hook fires and the next advance abandons the queue.
    pub fn interrupt(&mut self, ctx: &mut ActionContext) -> bool {
        if let Some(current) = self.queue.current_mut() {
            if !current.is_interruptible() {
                debug!(
                    agent = %ctx.agent,
                    action = current.name(),
                    "interrupt rejected"
                );
                return false;
            }
            self.state.interrupted = true;
            if current.completion().is_none() {
                current.interrupted(&mut self.state, ctx);
            }
        } else {
            self.state.interrupted = true;
        }
        true
    }

    /// Moves reservations out of another goal's state into this one,
    /// used when a job redirects the agent into a follow-up goal.
    pub fn adopt_allocations(&mut self, from: &mut GoalState) {
        self.state.assigned_job = from.assigned_job.take();
        self.state.hauling_allocation = from.hauling_allocation.take();
        self.state.liquid_allocation = from.liquid_allocation.take();
        self.state.assigned_furniture = from.assigned_furniture.take();
        self.state.relevant_memory = from.relevant_memory.take();
    }

    /// Releases everything this goal still holds. Safe to call on a
    /// goal that holds nothing; every cancellation path is idempotent.
    pub fn release_allocations(&mut self, agent: &AgentId, bus: &mut MessageBus) {
        if let Some(job) = self.state.assigned_job.take() {
            warn!(agent = %agent, job = %job.id, "returning unfinished job to the board");
            bus.dispatch(Message::CancelJobAssignment {
                agent: agent.clone(),
                job: job.id,
            });
        }
        if let Some(allocation) = self.state.hauling_allocation.take() {
            bus.dispatch(Message::CancelHaulingAllocation {
                allocation: allocation.id,
            });
        }
        if let Some(allocation) = self.state.liquid_allocation.take() {
            bus.dispatch(Message::CancelLiquidAllocation {
                allocation: allocation.id,
            });
        }
        // Offers may already have moved from the pending list into the
        // mailbox; a stale offer list must not reach the agent's next
        // job search.
        if bus.job_board.has_pending_request(agent) || bus.has_job_offers(agent) {
            bus.dispatch(Message::CancelJobRequest {
                agent: agent.clone(),
            });
        }
    }
}

impl std::fmt::Debug for AssignedGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignedGoal")
            .field("goal", &self.definition.id)
            .field("queue", &self.queue)
            .field("interrupted", &self.state.interrupted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::entity::Entity;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    use colony_messages::{Job, MessageKind};

    use crate::actions::ActionRegistry;
    use crate::components::{Inventory, MemoryKind, Needs, Position, WorldClock};
    use crate::config::Config;
    use crate::goals::definition::GoalLibrary;

    struct Harness {
        agent: AgentId,
        clock: WorldClock,
        config: Config,
        rng: SmallRng,
        bus: MessageBus,
        needs: Needs,
        inventory: Inventory,
        position: Position,
        memory: AgentMemory,
    }

    impl Harness {
        fn new() -> Self {
            let config = Config::default();
            Self {
                agent: AgentId::new("agent_001"),
                clock: WorldClock::new(config.simulation.seconds_per_tick),
                config,
                rng: SmallRng::seed_from_u64(3),
                bus: MessageBus::new(),
                needs: Needs::default(),
                inventory: Inventory::default(),
                position: Position::new("commons"),
                memory: AgentMemory::default(),
            }
        }

        fn ctx(&mut self) -> ActionContext<'_> {
            ActionContext {
                entity: Entity::PLACEHOLDER,
                agent: &self.agent,
                profession: None,
                clock: &self.clock,
                config: &self.config,
                rng: &mut self.rng,
                bus: &mut self.bus,
                needs: &mut self.needs,
                inventory: &mut self.inventory,
                position: &mut self.position,
                memory: &mut self.memory,
            }
        }
    }

    /// Teardown stand-in that refuses interruption and fails on its
    /// first tick.
    struct FailingTeardown {
        result: Option<CompletionResult>,
    }

    impl Action for FailingTeardown {
        fn name(&self) -> &'static str {
            "failing_teardown"
        }

        fn update(&mut self, _delta: f32, _goal: &mut GoalState, _ctx: &mut ActionContext) {
            self.result = Some(CompletionResult::Failure);
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

    struct OneTick {
        result: Option<CompletionResult>,
    }

    impl Action for OneTick {
        fn name(&self) -> &'static str {
            "one_tick"
        }

        fn update(&mut self, _delta: f32, _goal: &mut GoalState, _ctx: &mut ActionContext) {
            self.result = Some(CompletionResult::Success);
        }

        fn completion(&self) -> Option<CompletionResult> {
            self.result
        }

        fn set_completion(&mut self, result: Option<CompletionResult>) {
            self.result = result;
        }
    }

    #[test]
    fn test_deferred_push_survives_failing_final_action() {
        let mut harness = Harness::new();
        let definition =
            Arc::new(GoalDefinition::new("wind_down", "Wind Down").non_interruptible());
        let mut queue = ActionQueue::new();
        queue.push_back(Box::new(FailingTeardown { result: None }));
        let mut goal = AssignedGoal::from_parts(definition, queue, GoalState::default());

        {
            let mut ctx = harness.ctx();
            goal.push_interrupting(Box::new(OneTick { result: None }), &mut ctx);
        }
        // Parked, not inserted
        assert_eq!(goal.current_action_name(), Some("failing_teardown"));

        let delta = harness.config.simulation.seconds_per_tick;
        {
            let mut ctx = harness.ctx();
            assert_eq!(goal.advance(delta, &mut ctx), GoalAdvance::InProgress);
        }
        assert_eq!(goal.current_action_name(), Some("one_tick"));

        {
            let mut ctx = harness.ctx();
            assert_eq!(goal.advance(delta, &mut ctx), GoalAdvance::Completed);
        }
    }

    #[test]
    fn test_bind_relevant_memory_follows_selector() {
        let registry = ActionRegistry::with_builtin_actions();
        let library = GoalLibrary::with_builtin_goals();
        let mut memory = AgentMemory::new();
        memory.remember(MemoryKind::ThreatSighted, 9);

        let definition = library.get(&GoalId::new("respond_to_threat")).unwrap();
        let mut goal = AssignedGoal::instantiate(definition, &registry).unwrap();
        goal.bind_relevant_memory(&memory);
        assert_eq!(
            goal.state.relevant_memory.as_ref().map(|m| m.tick),
            Some(9)
        );

        // Goals without a memory condition bind nothing
        let definition = library.get(&GoalId::new("find_work")).unwrap();
        let mut plain = AssignedGoal::instantiate(definition, &registry).unwrap();
        plain.bind_relevant_memory(&memory);
        assert!(plain.state.relevant_memory.is_none());
    }

    #[test]
    fn test_release_drains_delivered_job_offers() {
        let mut harness = Harness::new();
        let agent = harness.agent.clone();
        harness.bus.dispatch(Message::RequestJob {
            agent: agent.clone(),
        });
        harness.bus.job_board.post(Job::new("mend_fence"));
        harness.bus.fulfill_pending_job_requests();
        assert!(harness.bus.has_job_offers(&agent));
        assert!(!harness.bus.job_board.has_pending_request(&agent));

        let registry = ActionRegistry::with_builtin_actions();
        let library = GoalLibrary::with_builtin_goals();
        let definition = library.get(&GoalId::new("find_work")).unwrap();
        let mut goal = AssignedGoal::instantiate(definition, &registry).unwrap();

        goal.release_allocations(&agent, &mut harness.bus);
        assert!(!harness.bus.has_job_offers(&agent));
        assert_eq!(harness.bus.sent_count(MessageKind::CancelJobRequest), 1);
    }
}
