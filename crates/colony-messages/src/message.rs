//! Bus Message Types
//!
//! The full vocabulary of the simulation message bus. Dispatch is
//! synchronous: the bus handles the message (and may produce a reply) before
//! the dispatch call returns. Cancellation messages are idempotent by
//! contract; sending one for an already-released resource is a no-op.

use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, AllocationId, FurnitureId, ItemTypeId, JobId, MaterialId};

/// Discriminant for a [`Message`], used for routing, filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    RequestJob,
    AcceptJob,
    CancelJobRequest,
    CancelJobAssignment,
    JobCompleted,
    RequestHaulingAllocation,
    CancelHaulingAllocation,
    RequestLiquidTransfer,
    CancelLiquidAllocation,
    EntityCreated,
    EntityDestroyed,
    AssetUpdateRequired,
}

/// A message dispatched over the simulation bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    // --- Job lifecycle ---
    /// Agent asks the job board for candidate jobs.
    RequestJob { agent: AgentId },
    /// Agent reserves a specific offered job.
    AcceptJob { agent: AgentId, job: JobId },
    /// Agent withdraws a still-pending job request (e.g. on timeout).
    CancelJobRequest { agent: AgentId },
    /// Agent gives a reserved job back to the board.
    CancelJobAssignment { agent: AgentId, job: JobId },
    /// Agent finished a job; carries both for stat/profession tracking.
    JobCompleted { agent: AgentId, job: JobId },

    // --- Hauling allocation ---
    RequestHaulingAllocation {
        agent: AgentId,
        origin_location: String,
        item_type: ItemTypeId,
        material: MaterialId,
    },
    CancelHaulingAllocation { allocation: AllocationId },

    // --- Liquid allocation / transfer ---
    RequestLiquidTransfer {
        agent: AgentId,
        material: MaterialId,
        amount: f32,
        source_location: String,
        target_location: String,
        container_item_type: ItemTypeId,
        profession: Option<String>,
        priority: i32,
    },
    CancelLiquidAllocation { allocation: AllocationId },

    // --- Entity lifecycle ---
    /// A new entity came into existence (e.g. a filled container).
    EntityCreated { entity: String },
    /// An entity was removed (e.g. an item stack hit zero quantity).
    EntityDestroyed { entity: String },
    /// An entity's visual state changed and trackers must refresh it.
    AssetUpdateRequired { furniture: FurnitureId },
}

impl Message {
    /// Returns the discriminant for this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::RequestJob { .. } => MessageKind::RequestJob,
            Message::AcceptJob { .. } => MessageKind::AcceptJob,
            Message::CancelJobRequest { .. } => MessageKind::CancelJobRequest,
            Message::CancelJobAssignment { .. } => MessageKind::CancelJobAssignment,
            Message::JobCompleted { .. } => MessageKind::JobCompleted,
            Message::RequestHaulingAllocation { .. } => {
                MessageKind::RequestHaulingAllocation
            }
            Message::CancelHaulingAllocation { .. } => {
                MessageKind::CancelHaulingAllocation
            }
            Message::RequestLiquidTransfer { .. } => MessageKind::RequestLiquidTransfer,
            Message::CancelLiquidAllocation { .. } => {
                MessageKind::CancelLiquidAllocation
            }
            Message::EntityCreated { .. } => MessageKind::EntityCreated,
            Message::EntityDestroyed { .. } => MessageKind::EntityDestroyed,
            Message::AssetUpdateRequired { .. } => MessageKind::AssetUpdateRequired,
        }
    }

    /// Returns true for the cancellation messages, which must be idempotent.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self.kind(),
            MessageKind::CancelJobRequest
                | MessageKind::CancelJobAssignment
                | MessageKind::CancelHaulingAllocation
                | MessageKind::CancelLiquidAllocation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let msg = Message::RequestJob {
            agent: AgentId::new("agent_001"),
        };
        assert_eq!(msg.kind(), MessageKind::RequestJob);
        assert!(!msg.is_cancellation());

        let cancel = Message::CancelHaulingAllocation {
            allocation: AllocationId::new("alloc_x"),
        };
        assert!(cancel.is_cancellation());
    }

    #[test]
    fn test_message_round_trips_through_json() {
        let msg = Message::AcceptJob {
            agent: AgentId::new("agent_001"),
            job: JobId::new("job_abc"),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("accept_job"));

        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), MessageKind::AcceptJob);
    }
}
