//! Engine Error Types
//!
//! Content and load errors are fatal by design: an unregistered action name
//! or a dangling save reference is a data bug, not a runtime condition, and
//! must surface immediately instead of being silently defaulted. Runtime
//! failures (preconditions, timeouts) never appear here; they are expressed
//! as action FAILURE results and absorbed at the goal-selection boundary.

use colony_messages::GoalId;
use thiserror::Error;

/// Fatal content/load errors raised by the goal engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An action name used by a goal definition or save file is not in the
    /// registry.
    #[error("unknown action type '{0}'")]
    UnknownAction(String),

    /// A goal id is not in the goal library.
    #[error("unknown goal '{0}'")]
    UnknownGoal(GoalId),

    /// A goal definition failed validation at load time.
    #[error("invalid goal definition '{goal}': {reason}")]
    InvalidGoalDefinition { goal: GoalId, reason: String },

    /// A save file references an id the load-time lookup table does not
    /// contain.
    #[error("missing {kind} reference '{id}' in save data")]
    MissingReference { kind: &'static str, id: String },

    /// An action rejected its persisted state.
    #[error("could not restore action '{action}': {reason}")]
    RestoreState { action: String, reason: String },
}
