//! ECS Components
//!
//! Component and world-state types for agents and the simulated clock.

pub mod agent;
pub mod world;

pub use agent::{Agent, AgentMemory, Inventory, MemoryEntry, MemoryKind, Needs, Weapon};
pub use world::{Position, WorldClock};
