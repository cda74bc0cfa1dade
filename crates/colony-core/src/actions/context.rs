//! Action Context
//!
//! The explicit per-tick context handed to every action call. Actions hold
//! no ambient back-references; everything they may touch - the owning
//! agent's components, the clock, the bus, the random source - arrives
//! through this struct, which keeps dependencies visible and testable.

use bevy_ecs::prelude::*;
use colony_messages::AgentId;
use rand::rngs::SmallRng;

use crate::bus::MessageBus;
use crate::components::{AgentMemory, Inventory, Needs, Position, WorldClock};
use crate::config::Config;

/// Everything an action may read or mutate during one tick.
pub struct ActionContext<'a> {
    /// The agent entity this goal acts on. Referenced, never owned.
    pub entity: Entity,
    pub agent: &'a AgentId,
    pub profession: Option<&'a str>,
    pub clock: &'a WorldClock,
    pub config: &'a Config,
    pub rng: &'a mut SmallRng,
    pub bus: &'a mut MessageBus,
    pub needs: &'a mut Needs,
    pub inventory: &'a mut Inventory,
    pub position: &'a mut Position,
    pub memory: &'a mut AgentMemory,
}
