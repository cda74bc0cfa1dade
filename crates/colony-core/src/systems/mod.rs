//! Systems
//!
//! The per-tick systems: needs decay, memory expiry, board drivers,
//! goal preemption, and the goal executor.

pub mod executor;
pub mod jobs;
pub mod memory;
pub mod needs;

pub use executor::{drive_goal_executors, preempt_goals, GoalRunner};
pub use jobs::{post_new_jobs, spawn_threats, JobDirector};
pub use memory::expire_memories;
pub use needs::decay_needs;
