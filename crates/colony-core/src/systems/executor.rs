//! Goal Executor
//!
//! The per-tick drive of the goal layer: idle agents pick a goal, busy
//! agents advance their current action, and a newly eligible
//! higher-priority goal preempts a running interruptible one. Every
//! goal teardown path releases whatever the goal still holds.

use bevy_ecs::prelude::*;
use tracing::{debug, warn};

use crate::actions::{ActionContext, ActionRegistry};
use crate::bus::MessageBus;
use crate::components::{Agent, AgentMemory, Inventory, Needs, Position, WorldClock};
use crate::config::Config;
use crate::goals::{select_goal, AssignedGoal, GoalAdvance, GoalLibrary};
use crate::SimRng;

/// Component: the agent's current assigned goal, if any.
#[derive(Component, Default)]
pub struct GoalRunner {
    pub goal: Option<AssignedGoal>,
}

/// System: ask running goals to stand down when a higher-priority goal
/// has become eligible. Non-interruptible goals and actions run on.
#[allow(clippy::type_complexity)]
pub fn preempt_goals(
    clock: Res<WorldClock>,
    config: Res<Config>,
    library: Res<GoalLibrary>,
    mut bus: ResMut<MessageBus>,
    mut rng: ResMut<SimRng>,
    mut query: Query<(
        Entity,
        &Agent,
        &mut Needs,
        &mut Inventory,
        &mut Position,
        &mut AgentMemory,
        &mut GoalRunner,
    )>,
) {
    for (entity, agent, mut needs, mut inventory, mut position, mut memory, mut runner) in
        query.iter_mut()
    {
        let Some(goal) = runner.goal.as_mut() else {
            continue;
        };
        if goal.state.interrupted || !goal.definition.interruptible {
            continue;
        }

        let Some(preferred) = select_goal(&library, clock.hour_of_day(), &needs, &memory)
        else {
            continue;
        };
        if &preferred == goal.goal_id() {
            continue;
        }

        let mut ctx = ActionContext {
            entity,
            agent: &agent.id,
            profession: agent.profession.as_deref(),
            clock: &clock,
            config: &config,
            rng: &mut rng.0,
            bus: &mut bus,
            needs: &mut needs,
            inventory: &mut inventory,
            position: &mut position,
            memory: &mut memory,
        };
        if goal.interrupt(&mut ctx) {
            debug!(
                agent = %agent.id,
                current = %goal.goal_id(),
                preferred = %preferred,
                "goal interrupted for higher-priority goal"
            );
        }
    }
}

/// System: assign goals to idle agents and advance running ones.
#[allow(clippy::type_complexity)]
pub fn drive_goal_executors(
    clock: Res<WorldClock>,
    config: Res<Config>,
    registry: Res<ActionRegistry>,
    library: Res<GoalLibrary>,
    mut bus: ResMut<MessageBus>,
    mut rng: ResMut<SimRng>,
    mut query: Query<(
        Entity,
        &Agent,
        &mut Needs,
        &mut Inventory,
        &mut Position,
        &mut AgentMemory,
        &mut GoalRunner,
    )>,
) {
    let delta = clock.seconds_per_tick;

    for (entity, agent, mut needs, mut inventory, mut position, mut memory, mut runner) in
        query.iter_mut()
    {
        if runner.goal.is_none() {
            if let Some(goal_id) =
                select_goal(&library, clock.hour_of_day(), &needs, &memory)
            {
                let Some(definition) = library.get(&goal_id) else {
                    warn!(agent = %agent.id, goal = %goal_id, "selected goal missing from library");
                    continue;
                };
                match AssignedGoal::instantiate(definition, &registry) {
                    Ok(mut goal) => {
                        goal.bind_relevant_memory(&memory);
                        debug!(agent = %agent.id, goal = %goal_id, "goal assigned");
                        runner.goal = Some(goal);
                    }
                    Err(err) => {
                        warn!(agent = %agent.id, goal = %goal_id, %err, "goal instantiation failed");
                        continue;
                    }
                }
            }
        }

        let outcome = {
            let Some(goal) = runner.goal.as_mut() else {
                continue;
            };
            let mut ctx = ActionContext {
                entity,
                agent: &agent.id,
                profession: agent.profession.as_deref(),
                clock: &clock,
                config: &config,
                rng: &mut rng.0,
                bus: &mut bus,
                needs: &mut needs,
                inventory: &mut inventory,
                position: &mut position,
                memory: &mut memory,
            };
            goal.advance(delta, &mut ctx)
        };

        match outcome {
            GoalAdvance::InProgress => {}
            GoalAdvance::Completed => {
                if let Some(mut finished) = runner.goal.take() {
                    debug!(agent = %agent.id, goal = %finished.goal_id(), "goal completed");
                    finished.release_allocations(&agent.id, &mut bus);
                }
            }
            GoalAdvance::Abandoned => {
                if let Some(mut abandoned) = runner.goal.take() {
                    debug!(agent = %agent.id, goal = %abandoned.goal_id(), "goal abandoned");
                    abandoned.release_allocations(&agent.id, &mut bus);
                }
            }
            GoalAdvance::Switch(next) => {
                let Some(mut previous) = runner.goal.take() else {
                    continue;
                };
                let Some(definition) = library.get(&next) else {
                    warn!(agent = %agent.id, goal = %next, "switch target missing from library");
                    previous.release_allocations(&agent.id, &mut bus);
                    continue;
                };
                match AssignedGoal::instantiate(definition, &registry) {
                    Ok(mut replacement) => {
                        // Reservations follow the agent into the new
                        // goal instead of bouncing through the board.
                        replacement.adopt_allocations(&mut previous.state);
                        if replacement.state.relevant_memory.is_none() {
                            replacement.bind_relevant_memory(&memory);
                        }
                        previous.release_allocations(&agent.id, &mut bus);
                        debug!(agent = %agent.id, from = %previous.goal_id(), to = %next, "goal switched");
                        runner.goal = Some(replacement);
                    }
                    Err(err) => {
                        warn!(agent = %agent.id, goal = %next, %err, "switch target failed to instantiate");
                        previous.release_allocations(&agent.id, &mut bus);
                    }
                }
            }
        }
    }
}
