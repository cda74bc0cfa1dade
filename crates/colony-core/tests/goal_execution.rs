//! Goal execution integration tests
//!
//! Drives full goals through the action queue against a live message
//! bus and checks the teardown invariants: goals finish in bounded
//! time, abandoned goals hold no reservations, and preempted actions
//! resume with their progress intact.

use std::sync::Arc;

use bevy_ecs::entity::Entity;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use colony_messages::{AgentId, FurnitureId, GoalId, Job, MessageKind};

use colony_core::actions::{
    ActionContext, ActionRegistry, CancelLiquidAllocationAction, SleepAction,
};
use colony_core::bus::{LiquidSource, MessageBus, StockpileItem};
use colony_core::components::{
    AgentMemory, Inventory, MemoryKind, Needs, Position, Weapon, WorldClock,
};
use colony_core::config::Config;
use colony_core::goals::{
    save_goal, select_goal, AssignedGoal, GoalAdvance, GoalDefinition, GoalLibrary,
};

/// One agent's worth of goal-execution state, outside any ECS world.
struct Fixture {
    agent: AgentId,
    profession: Option<String>,
    clock: WorldClock,
    config: Config,
    rng: SmallRng,
    bus: MessageBus,
    needs: Needs,
    inventory: Inventory,
    position: Position,
    memory: AgentMemory,
    registry: ActionRegistry,
    library: GoalLibrary,
}

impl Fixture {
    fn new() -> Self {
        let config = Config::default();
        Self {
            agent: AgentId::new("agent_001"),
            profession: None,
            clock: WorldClock::new(config.simulation.seconds_per_tick),
            config,
            rng: SmallRng::seed_from_u64(7),
            bus: MessageBus::new(),
            needs: Needs::default(),
            inventory: Inventory::default(),
            position: Position::new("commons"),
            memory: AgentMemory::default(),
            registry: ActionRegistry::with_builtin_actions(),
            library: GoalLibrary::with_builtin_goals(),
        }
    }

    fn ctx(&mut self) -> ActionContext<'_> {
        ActionContext {
            entity: Entity::PLACEHOLDER,
            agent: &self.agent,
            profession: self.profession.as_deref(),
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

    fn instantiate(&self, goal: &str) -> AssignedGoal {
        let definition = self.library.get(&GoalId::new(goal)).expect("builtin goal");
        AssignedGoal::instantiate(definition, &self.registry).expect("instantiation")
    }

    /// Advances the goal tick by tick until it stops being in progress
    /// or the tick budget runs out.
    fn run(&mut self, goal: &mut AssignedGoal, max_ticks: u32) -> GoalAdvance {
        let delta = self.config.simulation.seconds_per_tick;
        let mut last = GoalAdvance::InProgress;
        for _ in 0..max_ticks {
            let mut ctx = self.ctx();
            last = goal.advance(delta, &mut ctx);
            if last != GoalAdvance::InProgress {
                break;
            }
        }
        last
    }
}

#[test]
fn test_find_work_completes_and_holds_nothing() {
    let mut fx = Fixture::new();
    let job = Job::new("mend_fence");
    let job_id = job.id.clone();
    fx.bus.job_board.post(job);

    let mut goal = fx.instantiate("find_work");
    let outcome = fx.run(&mut goal, 20);

    assert_eq!(outcome, GoalAdvance::Completed);
    assert_eq!(fx.bus.sent_count(MessageKind::JobCompleted), 1);
    assert_eq!(fx.bus.job_board.completed_count(&fx.agent), 1);
    assert!(!fx.bus.job_board.get(&job_id).unwrap().is_open());
    assert_eq!(fx.bus.allocations_held_by(&fx.agent), 0);
}

#[test]
fn test_job_request_timeout_fails_with_one_cancellation() {
    let mut fx = Fixture::new();

    // Empty board: the request parks, then times out.
    let mut goal = fx.instantiate("find_work");
    let outcome = fx.run(&mut goal, 20);

    assert_eq!(outcome, GoalAdvance::Completed);
    assert_eq!(fx.bus.sent_count(MessageKind::CancelJobRequest), 1);
    assert_eq!(fx.bus.sent_count(MessageKind::AcceptJob), 0);
    assert!(!fx.bus.job_board.has_pending_request(&fx.agent));
}

#[test]
fn test_unarmed_agent_skips_weapon_jobs() {
    let mut fx = Fixture::new();
    let job = Job::new("guard_duty").with_weapon_required();
    let job_id = job.id.clone();
    fx.bus.job_board.post(job);

    let mut goal = fx.instantiate("find_work");
    let delta = fx.config.simulation.seconds_per_tick;
    {
        let mut ctx = fx.ctx();
        goal.advance(delta, &mut ctx);
    }

    // The only offer is unsuitable, so selection fails on the spot.
    assert_eq!(fx.bus.sent_count(MessageKind::AcceptJob), 0);
    assert!(fx.bus.job_board.get(&job_id).unwrap().is_open());
}

#[test]
fn test_armed_agent_takes_weapon_job() {
    let mut fx = Fixture::new();
    fx.inventory.weapon = Some(Weapon::melee("sword"));
    fx.bus
        .job_board
        .post(Job::new("guard_duty").with_weapon_required());

    let mut goal = fx.instantiate("find_work");
    let outcome = fx.run(&mut goal, 20);

    assert_eq!(outcome, GoalAdvance::Completed);
    assert_eq!(fx.bus.sent_count(MessageKind::AcceptJob), 1);
}

#[test]
fn test_job_goal_switch_carries_assigned_job() {
    let mut fx = Fixture::new();
    fx.inventory.weapon = Some(Weapon::melee("sword"));
    fx.bus.job_board.post(
        Job::new("guard_duty")
            .with_weapon_required()
            .with_goal_switch(GoalId::new("respond_to_threat")),
    );

    let mut goal = fx.instantiate("find_work");
    let outcome = fx.run(&mut goal, 5);

    assert_eq!(
        outcome,
        GoalAdvance::Switch(GoalId::new("respond_to_threat"))
    );
    // The accepted job travels on the goal state for the executor to
    // move into the replacement goal.
    assert!(goal.state.assigned_job.is_some());
}

#[test]
fn test_hauling_goal_end_to_end() {
    let mut fx = Fixture::new();
    fx.bus.hauling.stock(StockpileItem {
        item_type: "plank".into(),
        material: "oak".into(),
        location: "sawmill_yard".to_string(),
    });

    let mut goal = fx.instantiate("haul_goods");
    let outcome = fx.run(&mut goal, 20);

    assert_eq!(outcome, GoalAdvance::Completed);
    assert_eq!(fx.position.location_id, "sawmill_yard");
    assert_eq!(fx.inventory.carried.len(), 1);
    assert_eq!(fx.bus.sent_count(MessageKind::EntityDestroyed), 1);
    // Fulfilled, not cancelled: nothing returns to the stockpile.
    assert_eq!(fx.bus.sent_count(MessageKind::CancelHaulingAllocation), 0);
    assert_eq!(fx.bus.hauling.live_held_by(&fx.agent), 0);
    assert!(fx.bus.hauling.peek_available().is_none());
}

#[test]
fn test_abandoned_hauling_goal_releases_reservation() {
    let mut fx = Fixture::new();
    fx.bus.hauling.stock(StockpileItem {
        item_type: "plank".into(),
        material: "oak".into(),
        location: "sawmill_yard".to_string(),
    });

    let mut goal = fx.instantiate("haul_goods");
    let delta = fx.config.simulation.seconds_per_tick;

    // Reserve the item, then get partway through the walk.
    {
        let mut ctx = fx.ctx();
        assert_eq!(goal.advance(delta, &mut ctx), GoalAdvance::InProgress);
        assert_eq!(goal.advance(delta, &mut ctx), GoalAdvance::InProgress);
    }
    assert_eq!(fx.bus.hauling.live_held_by(&fx.agent), 1);

    {
        let mut ctx = fx.ctx();
        assert!(goal.interrupt(&mut ctx));
    }
    let outcome = fx.run(&mut goal, 5);
    assert_eq!(outcome, GoalAdvance::Abandoned);

    goal.release_allocations(&fx.agent, &mut fx.bus);
    assert_eq!(fx.bus.allocations_held_by(&fx.agent), 0);
    // The item went back on the pile for someone else.
    assert!(fx.bus.hauling.peek_available().is_some());
}

#[test]
fn test_abandoned_job_returns_to_board() {
    let mut fx = Fixture::new();
    fx.bus
        .job_board
        .post(Job::new("long_haul").with_duration(600.0));

    let mut goal = fx.instantiate("find_work");
    let delta = fx.config.simulation.seconds_per_tick;
    {
        let mut ctx = fx.ctx();
        // Select the job, then start working it.
        assert_eq!(goal.advance(delta, &mut ctx), GoalAdvance::InProgress);
        assert_eq!(goal.advance(delta, &mut ctx), GoalAdvance::InProgress);
    }
    assert_eq!(fx.bus.job_board.assigned_count(&fx.agent), 1);

    {
        let mut ctx = fx.ctx();
        assert!(goal.interrupt(&mut ctx));
    }
    assert_eq!(fx.run(&mut goal, 5), GoalAdvance::Abandoned);

    goal.release_allocations(&fx.agent, &mut fx.bus);
    assert_eq!(fx.bus.job_board.assigned_count(&fx.agent), 0);
    assert_eq!(fx.bus.job_board.open_offers().len(), 1);
}

#[test]
fn test_fetch_liquid_goal_restores_hunger() {
    let mut fx = Fixture::new();
    fx.needs.hunger = 0.2;
    fx.bus.liquid.add_source(LiquidSource {
        location: "village_well".to_string(),
        material: "water".into(),
        available_litres: 100.0,
    });

    let mut goal = fx.instantiate("fetch_liquid");
    let outcome = fx.run(&mut goal, 20);

    assert_eq!(outcome, GoalAdvance::Completed);
    assert_eq!(fx.position.location_id, "village_well");
    assert_eq!(fx.needs.hunger, 1.0);
    assert_eq!(fx.bus.liquid.live_held_by(&fx.agent), 0);
    // Consumed allocation, so the tail cancel had nothing to send.
    assert_eq!(fx.bus.sent_count(MessageKind::CancelLiquidAllocation), 0);
}

#[test]
fn test_combat_goal_clears_threat_within_budget() {
    let mut fx = Fixture::new();
    fx.inventory.weapon = Some(Weapon::ranged("crossbow"));
    fx.inventory.ammo = 10;
    fx.memory.remember(MemoryKind::ThreatSighted, 0);

    let mut goal = fx.instantiate("respond_to_threat");
    let outcome = fx.run(&mut goal, 30);

    assert_eq!(outcome, GoalAdvance::Completed);
    assert!(!fx.memory.contains(MemoryKind::ThreatSighted));
    assert_eq!(fx.bus.sent_count(MessageKind::EntityDestroyed), 1);
    assert_eq!(fx.inventory.ammo, 7);
}

#[test]
fn test_combat_without_ammo_fails() {
    let mut fx = Fixture::new();
    fx.inventory.weapon = Some(Weapon::ranged("crossbow"));
    fx.inventory.ammo = 1;
    fx.memory.remember(MemoryKind::ThreatSighted, 0);

    let mut goal = fx.instantiate("respond_to_threat");
    let outcome = fx.run(&mut goal, 30);

    // One strike lands, then the quiver runs dry mid-fight.
    assert_eq!(outcome, GoalAdvance::Completed);
    assert!(fx.memory.contains(MemoryKind::ThreatSighted));
    assert_eq!(fx.bus.sent_count(MessageKind::EntityDestroyed), 0);
}

#[test]
fn test_unarmed_agent_lets_threat_sighting_go() {
    let mut fx = Fixture::new();
    fx.needs.rest = 0.2;
    fx.memory.remember(MemoryKind::ThreatSighted, 0);

    let mut goal = fx.instantiate("respond_to_threat");
    let outcome = fx.run(&mut goal, 3);

    // No weapon at all: the goal ends and the sighting goes with it, so
    // the agent is not pinned to the threat goal until it starves.
    assert_eq!(outcome, GoalAdvance::Completed);
    assert!(!fx.memory.contains(MemoryKind::ThreatSighted));
    assert!(goal.state.relevant_memory.is_none());

    let next = select_goal(&fx.library, fx.clock.hour_of_day(), &fx.needs, &fx.memory);
    assert_eq!(next.as_ref().map(|g| g.as_str()), Some("sleep"));
}

#[test]
fn test_interrupted_sleeper_vacates_bed() {
    let mut fx = Fixture::new();
    fx.needs.rest = 0.2;

    let mut goal = fx.instantiate("sleep");
    goal.state.assigned_furniture = Some(FurnitureId::new("bed_01"));

    let delta = fx.config.simulation.seconds_per_tick;
    {
        let mut ctx = fx.ctx();
        assert_eq!(goal.advance(delta, &mut ctx), GoalAdvance::InProgress);
    }
    assert_eq!(fx.bus.sent_count(MessageKind::AssetUpdateRequired), 1);

    {
        let mut ctx = fx.ctx();
        assert!(goal.interrupt(&mut ctx));
    }
    assert_eq!(fx.run(&mut goal, 5), GoalAdvance::Abandoned);

    // Standing up cleared the bed claim and refreshed its asset.
    assert!(goal.state.assigned_furniture.is_none());
    assert_eq!(fx.bus.sent_count(MessageKind::AssetUpdateRequired), 2);
}

#[test]
fn test_preempted_travel_resumes_with_progress() {
    let mut fx = Fixture::new();
    let definition = Arc::new(
        GoalDefinition::new("walk_home", "Walk Home").with_actions(vec!["go_to_location"]),
    );
    let mut goal = AssignedGoal::instantiate(definition, &fx.registry).expect("instantiation");
    goal.state.target_location = Some("village_well".to_string());

    let delta = fx.config.simulation.seconds_per_tick;
    {
        let mut ctx = fx.ctx();
        // Halfway through the 180s leg after one 90s tick.
        assert_eq!(goal.advance(delta, &mut ctx), GoalAdvance::InProgress);
    }

    {
        let mut ctx = fx.ctx();
        goal.push_interrupting(Box::new(CancelLiquidAllocationAction::new()), &mut ctx);
    }
    assert_eq!(goal.current_action_name(), Some("cancel_liquid_allocation"));

    // The walk kept its elapsed time through the preemption.
    let saved = save_goal(&goal);
    let walk = saved
        .actions
        .iter()
        .find(|a| a.name == "go_to_location")
        .expect("walk still queued");
    assert_eq!(walk.state["elapsed_seconds"], 90.0);

    // One tick finishes the insert, one more finishes the walk.
    assert_eq!(fx.run(&mut goal, 2), GoalAdvance::Completed);
    assert_eq!(fx.position.location_id, "village_well");
}

#[test]
fn test_non_interruptible_action_defers_interruption() {
    let mut fx = Fixture::new();
    let definition = Arc::new(
        GoalDefinition::new("teardown", "Teardown")
            .with_actions(vec!["cancel_hauling_allocation"]),
    );
    let mut goal = AssignedGoal::instantiate(definition, &fx.registry).expect("instantiation");

    {
        let mut ctx = fx.ctx();
        assert!(!goal.interrupt(&mut ctx));
    }
    assert!(!goal.state.interrupted);

    {
        let mut ctx = fx.ctx();
        goal.push_interrupting(Box::new(SleepAction::new()), &mut ctx);
    }
    // The push parked instead of displacing the teardown step.
    assert_eq!(goal.current_action_name(), Some("cancel_hauling_allocation"));

    let delta = fx.config.simulation.seconds_per_tick;
    {
        let mut ctx = fx.ctx();
        assert_eq!(goal.advance(delta, &mut ctx), GoalAdvance::InProgress);
    }
    // Teardown finished, the parked action takes over.
    assert_eq!(goal.current_action_name(), Some("sleep"));
}

#[test]
fn test_sleep_goal_completes_at_wake_threshold() {
    let mut fx = Fixture::new();
    fx.needs.rest = 0.9;

    let mut goal = fx.instantiate("sleep");
    let outcome = fx.run(&mut goal, 30);

    assert_eq!(outcome, GoalAdvance::Completed);
    assert!(fx.needs.rest >= fx.config.sleep.wake_threshold);
}

#[test]
fn test_cancel_action_releases_held_allocation_once() {
    let mut fx = Fixture::new();
    fx.bus.hauling.stock(StockpileItem {
        item_type: "plank".into(),
        material: "oak".into(),
        location: "sawmill_yard".to_string(),
    });

    let definition = Arc::new(
        GoalDefinition::new("teardown", "Teardown")
            .with_actions(vec!["request_hauling_allocation", "cancel_hauling_allocation"]),
    );
    let mut goal = AssignedGoal::instantiate(definition, &fx.registry).expect("instantiation");

    let outcome = fx.run(&mut goal, 5);
    assert_eq!(outcome, GoalAdvance::Completed);
    assert_eq!(fx.bus.sent_count(MessageKind::CancelHaulingAllocation), 1);
    assert!(goal.state.hauling_allocation.is_none());
    // Cancellation restocked the item.
    assert!(fx.bus.hauling.peek_available().is_some());
    assert_eq!(fx.bus.hauling.live_held_by(&fx.agent), 0);
}

#[test]
fn test_cancel_action_is_idempotent_for_empty_state() {
    let mut fx = Fixture::new();
    let definition = Arc::new(
        GoalDefinition::new("teardown", "Teardown")
            .with_actions(vec!["cancel_hauling_allocation"]),
    );
    let mut goal = AssignedGoal::instantiate(definition, &fx.registry).expect("instantiation");

    // Nothing to cancel: succeed without sending anything.
    assert_eq!(fx.run(&mut goal, 2), GoalAdvance::Completed);
    assert_eq!(fx.bus.sent_count(MessageKind::CancelHaulingAllocation), 0);
}
