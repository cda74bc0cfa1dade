//! Colony Goal Execution Engine
//!
//! A headless settlement simulation: agents pick goals, run their
//! action queues against the message bus, and react to threats, thirst,
//! and the job board.

use bevy_ecs::prelude::*;
use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use colony_messages::{AgentId, MaterialId, MessageKind};

use colony_core::actions::ActionRegistry;
use colony_core::bus::{LiquidSource, MessageBus, StockpileItem};
use colony_core::components::{
    Agent, AgentMemory, Inventory, Needs, Position, Weapon, WorldClock,
};
use colony_core::config::{Config, DEFAULT_TUNING_PATH};
use colony_core::goals::GoalLibrary;
use colony_core::systems::{
    decay_needs, drive_goal_executors, expire_memories, post_new_jobs, preempt_goals,
    spawn_threats, GoalRunner, JobDirector,
};
use colony_core::SimRng;

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "colony_sim")]
#[command(about = "A goal-driven colony simulation engine")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate (defaults to the tuning file value)
    #[arg(long)]
    ticks: Option<u64>,

    /// Number of agents to spawn
    #[arg(long, default_value_t = 6)]
    agents: usize,

    /// Path to the tuning file
    #[arg(long, default_value = DEFAULT_TUNING_PATH)]
    tuning: String,
}

const AGENT_ROSTER: &[(&str, Option<&str>)] = &[
    ("Alric", Some("carpenter")),
    ("Berta", Some("smith")),
    ("Cedric", None),
    ("Dagny", Some("carpenter")),
    ("Edwin", None),
    ("Freya", None),
    ("Gunnar", Some("smith")),
    ("Hilde", None),
];

fn main() {
    let args = Args::parse();
    let config = Config::load_or_default(&args.tuning);
    let ticks = args.ticks.unwrap_or(config.simulation.default_ticks);

    println!("Colony Simulation Engine");
    println!("========================");
    println!("Seed: {}", args.seed);
    println!("Ticks: {}", ticks);
    println!("Agents: {}", args.agents);
    println!();

    let mut world = World::new();

    world.insert_resource(WorldClock::new(config.simulation.seconds_per_tick));
    world.insert_resource(SimRng(SmallRng::seed_from_u64(args.seed)));
    world.insert_resource(JobDirector::new());

    let registry = ActionRegistry::with_builtin_actions();
    let library = GoalLibrary::with_builtin_goals();
    if let Err(err) = library.validate(&registry) {
        eprintln!("Invalid goal library: {}", err);
        std::process::exit(1);
    }
    world.insert_resource(registry);
    world.insert_resource(library);

    // Seed the settlement: a stocked well, some goods waiting to be
    // hauled, and an initially empty job board the director will fill.
    println!("Preparing the settlement...");
    let mut bus = MessageBus::new();
    bus.liquid.add_source(LiquidSource {
        location: "village_well".to_string(),
        material: MaterialId::new(config.liquid.material.clone()),
        available_litres: 500.0,
    });
    for _ in 0..4 {
        bus.hauling.stock(StockpileItem {
            item_type: "plank".into(),
            material: "oak".into(),
            location: "sawmill_yard".to_string(),
        });
    }
    world.insert_resource(bus);
    world.insert_resource(config);

    println!("Spawning agents...");
    for index in 0..args.agents {
        let (name, profession) = AGENT_ROSTER[index % AGENT_ROSTER.len()];
        let id = format!("agent_{:03}", index + 1);

        let mut agent = Agent::new(id.clone(), name);
        if let Some(profession) = profession {
            agent = agent.with_profession(profession);
        }

        // Every third agent is armed and can take guard work.
        let inventory = match index % 3 {
            0 => Inventory {
                weapon: Some(Weapon::melee("sword")),
                ..Inventory::default()
            },
            1 => Inventory {
                weapon: Some(Weapon::ranged("crossbow")),
                ammo: 12,
                ..Inventory::default()
            },
            _ => Inventory::default(),
        };

        world.spawn((
            agent,
            Needs::default(),
            inventory,
            Position::new("commons"),
            AgentMemory::default(),
            GoalRunner::default(),
        ));
        println!("  {} ({})", id, profession.unwrap_or("laborer"));
    }

    let mut schedule = Schedule::default();
    schedule.add_systems((decay_needs, expire_memories, post_new_jobs, spawn_threats).chain());
    schedule.add_systems(preempt_goals.after(spawn_threats));
    schedule.add_systems(drive_goal_executors.after(preempt_goals));

    println!();
    println!("Starting simulation...");
    println!();

    for tick in 0..ticks {
        schedule.run(&mut world);
        world.resource_mut::<WorldClock>().advance();

        if tick > 0 && tick % 100 == 0 {
            let clock = world.resource::<WorldClock>();
            let time = clock.formatted();
            let bus = world.resource::<MessageBus>();
            println!(
                "[{}] tick {}: {} messages ({} job requests, {} completions, {} cancellations)",
                time,
                tick,
                bus.sent().len(),
                bus.sent_count(MessageKind::RequestJob),
                bus.sent_count(MessageKind::JobCompleted),
                bus.sent_count(MessageKind::CancelJobRequest)
                    + bus.sent_count(MessageKind::CancelJobAssignment)
                    + bus.sent_count(MessageKind::CancelHaulingAllocation)
                    + bus.sent_count(MessageKind::CancelLiquidAllocation),
            );
        }
    }

    println!();
    println!("Simulation complete");
    println!("===================");

    let agent_ids: Vec<AgentId> = {
        let mut query = world.query::<&Agent>();
        query.iter(&world).map(|agent| agent.id.clone()).collect()
    };
    let mut completions: Vec<(AgentId, u32)> = {
        let bus = world.resource::<MessageBus>();
        agent_ids
            .iter()
            .map(|id| (id.clone(), bus.job_board.completed_count(id)))
            .collect()
    };
    completions.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));

    let bus = world.resource::<MessageBus>();
    println!("Total messages: {}", bus.sent().len());
    println!("Jobs completed:");
    for (agent, count) in &completions {
        println!("  {}: {}", agent, count);
    }

    let outstanding: usize = completions
        .iter()
        .map(|(agent, _)| bus.allocations_held_by(agent))
        .sum();
    println!("Outstanding reservations: {}", outstanding);
}
