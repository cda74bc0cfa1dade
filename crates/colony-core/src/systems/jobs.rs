//! Job Board Drivers
//!
//! Demo-world systems that keep the settlement busy: periodic job
//! postings, stockpile restocking, and occasional threat sightings.
//! These stand in for the production and combat layers that would feed
//! the board in a full game.

use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::info;

use colony_messages::{FurnitureId, GoalId, ItemTypeId, Job, MaterialId};

use crate::bus::{MessageBus, StockpileItem};
use crate::components::{AgentMemory, MemoryKind, WorldClock};
use crate::config::Config;
use crate::SimRng;

/// Job templates cycled through by the posting system.
const JOB_TEMPLATES: &[(&str, Option<&str>, i32)] = &[
    ("saw_planks", Some("carpenter"), 3),
    ("forge_nails", Some("smith"), 3),
    ("mend_fence", None, 2),
    ("sweep_hall", None, 1),
];

/// Resource: tick bookkeeping for the board drivers.
#[derive(Resource, Debug)]
pub struct JobDirector {
    last_post_tick: u64,
    last_threat_tick: u64,
    posted_batches: u64,
}

impl Default for JobDirector {
    fn default() -> Self {
        Self {
            last_post_tick: 0,
            last_threat_tick: 0,
            posted_batches: 0,
        }
    }
}

impl JobDirector {
    pub fn new() -> Self {
        Self::default()
    }

    fn should_post(&self, tick: u64, interval: u64) -> bool {
        tick >= self.last_post_tick + interval
    }

    fn should_threaten(&self, tick: u64, interval: u64) -> bool {
        tick > 0 && tick >= self.last_threat_tick + interval
    }
}

/// System: post a small batch of jobs and restock the stockpiles at the
/// configured interval, then answer any parked job requests.
pub fn post_new_jobs(
    clock: Res<WorldClock>,
    config: Res<Config>,
    mut director: ResMut<JobDirector>,
    mut bus: ResMut<MessageBus>,
    mut rng: ResMut<SimRng>,
) {
    let tick = clock.tick();
    if director.should_post(tick, config.jobs.post_interval_ticks) {
        director.last_post_tick = tick;
        director.posted_batches += 1;

        for _ in 0..2 {
            let (name, profession, priority) =
                JOB_TEMPLATES[rng.0.gen_range(0..JOB_TEMPLATES.len())];
            let mut job = Job::new(name).with_priority(priority);
            if let Some(profession) = profession {
                job = job.with_profession(profession);
            }
            // Crafting jobs occasionally finish at a workbench.
            if rng.0.gen_bool(0.25) {
                job = job.with_furniture(FurnitureId::new("workbench_01"));
            }
            bus.job_board.post(job);
        }

        // Every few batches, a guard posting that hands the worker over
        // to the threat-response goal once accepted.
        if director.posted_batches % 4 == 0 {
            bus.job_board.post(
                Job::new("guard_duty")
                    .with_weapon_required()
                    .with_goal_switch(GoalId::new("respond_to_threat"))
                    .with_priority(5),
            );
        }

        bus.hauling.stock(StockpileItem {
            item_type: ItemTypeId::new("plank"),
            material: MaterialId::new("oak"),
            location: "sawmill_yard".to_string(),
        });
    }

    bus.fulfill_pending_job_requests();
}

/// System: at the configured interval, every agent spots a threat. The
/// memory entry makes the threat-response goal eligible and triggers
/// goal interruption.
pub fn spawn_threats(
    clock: Res<WorldClock>,
    config: Res<Config>,
    mut director: ResMut<JobDirector>,
    mut query: Query<&mut AgentMemory>,
) {
    let tick = clock.tick();
    if !director.should_threaten(tick, config.jobs.threat_interval_ticks) {
        return;
    }
    director.last_threat_tick = tick;

    info!(tick, "threat sighted near the settlement");
    for mut memory in query.iter_mut() {
        memory.remember(MemoryKind::ThreatSighted, tick);
    }
}
