//! Colony Goal Execution Engine Library
//!
//! Public API for the goal and action execution core: agents carry a
//! stack of actions belonging to their current goal, actions talk to
//! the settlement through a typed message bus, and in-flight goals can
//! be saved and restored.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod actions;
pub mod bus;
pub mod components;
pub mod config;
pub mod error;
pub mod goals;
pub mod systems;

pub use actions::{Action, ActionContext, ActionPoll, ActionRegistry, CompletionResult};
pub use bus::{BusReply, MessageBus};
pub use components::*;
pub use config::Config;
pub use error::CoreError;
pub use goals::{AssignedGoal, GoalAdvance, GoalLibrary, GoalState};
pub use systems::GoalRunner;

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
