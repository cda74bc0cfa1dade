//! Memory System
//!
//! Expiry of stale remembered facts. A sighting nobody could act on
//! must not drive goal selection forever, so every memory fades after
//! the configured lifetime.

use bevy_ecs::prelude::*;

use crate::components::{AgentMemory, WorldClock};
use crate::config::Config;

/// System: drop memory entries older than the configured lifetime.
pub fn expire_memories(
    clock: Res<WorldClock>,
    config: Res<Config>,
    mut query: Query<&mut AgentMemory>,
) {
    let ttl_ticks = (config.memory.ttl_hours * 3600.0 / clock.seconds_per_tick) as u64;
    let now = clock.tick();
    for mut memory in query.iter_mut() {
        memory.expire(now, ttl_ticks.max(1));
    }
}
