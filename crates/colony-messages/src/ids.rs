//! Identifier Types
//!
//! String-backed newtype ids shared across the workspace. Jobs and
//! allocations get freshly generated ids; the rest are content-defined
//! (agents, goals, item types) and are constructed from their data.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id! {
    /// Identifies one agent entity. The engine references agents, it never
    /// owns them.
    AgentId
}

string_id! {
    /// Identifies a job on the job board.
    JobId
}

string_id! {
    /// Identifies a hauling or liquid allocation record.
    AllocationId
}

string_id! {
    /// Identifies a furniture entity (bed, crafting station, barrel).
    FurnitureId
}

string_id! {
    /// Identifies an item type from content data (e.g. "crossbow").
    ItemTypeId
}

string_id! {
    /// Identifies a material from content data (e.g. "oak", "water").
    MaterialId
}

string_id! {
    /// Identifies a goal definition in the goal library.
    GoalId
}

impl JobId {
    /// Generates a fresh unique job id.
    pub fn generate() -> Self {
        Self(format!("job_{}", Uuid::new_v4().simple()))
    }
}

impl AllocationId {
    /// Generates a fresh unique allocation id.
    pub fn generate() -> Self {
        Self(format!("alloc_{}", Uuid::new_v4().simple()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("job_"));
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = AgentId::new("agent_001");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"agent_001\"");

        let back: AgentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
