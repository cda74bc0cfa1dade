//! Shared message and allocation types for the colony simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod hauling;
pub mod ids;
pub mod job;
pub mod liquid;
pub mod message;
pub mod timestamp;

// Re-export id types
pub use ids::{
    AgentId, AllocationId, FurnitureId, GoalId, ItemTypeId, JobId, MaterialId,
};

// Re-export timestamp types
pub use timestamp::{ScheduleCategory, WorldTime, HOURS_PER_DAY, TICKS_PER_DAY};

// Re-export job types
pub use job::{Job, JobState};

// Re-export allocation types
pub use hauling::HaulingAllocation;
pub use liquid::LiquidAllocation;

// Re-export message types
pub use message::{Message, MessageKind};
