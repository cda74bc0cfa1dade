//! Goals
//!
//! The goal layer: static definitions and their selectors, the
//! per-agent assigned goal with its action queue, goal selection for
//! idle agents, and save/restore of in-flight goals.

pub mod assigned;
pub mod definition;
pub mod persistence;
pub mod queue;
pub mod select;

pub use assigned::{AssignedGoal, GoalAdvance, GoalState};
pub use definition::{
    GoalDefinition, GoalLibrary, GoalSelector, NeedKind, SelectorCondition,
};
pub use persistence::{
    restore_goal, save_goal, SaveLookup, SavedAction, SavedGoal, SavedGoalState,
};
pub use queue::ActionQueue;
pub use select::select_goal;
