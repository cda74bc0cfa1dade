//! Liquid Allocation Types
//!
//! A liquid allocation reserves a quantity of liquid at a source (a well, a
//! barrel) for transfer or removal by one agent carrying a container. Same
//! single-writer and idempotent-release rules as hauling allocations.

use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, AllocationId, ItemTypeId, MaterialId};

/// Reservation of a quantity of liquid for transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidAllocation {
    pub id: AllocationId,
    pub material: MaterialId,
    /// Reserved quantity in litres.
    pub amount: f32,
    pub source_location: String,
    pub target_location: String,
    /// Container item type the agent carries the liquid in.
    pub container_item_type: ItemTypeId,
    /// Profession the created transfer job is restricted to, if any.
    pub profession: Option<String>,
    pub priority: i32,
    pub owner: Option<AgentId>,
    /// Set once released; further releases are no-ops.
    pub cancelled: bool,
}

impl LiquidAllocation {
    pub fn new(
        material: MaterialId,
        amount: f32,
        source_location: impl Into<String>,
        target_location: impl Into<String>,
        container_item_type: ItemTypeId,
    ) -> Self {
        Self {
            id: AllocationId::generate(),
            material,
            amount,
            source_location: source_location.into(),
            target_location: target_location.into(),
            container_item_type,
            profession: None,
            priority: 0,
            owner: None,
            cancelled: false,
        }
    }

    pub fn with_profession(mut self, profession: impl Into<String>) -> Self {
        self.profession = Some(profession.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_owner(mut self, owner: AgentId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Releases the reservation. Idempotent.
    pub fn release(&mut self) {
        self.cancelled = true;
        self.owner = None;
    }

    pub fn is_live(&self) -> bool {
        !self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_is_idempotent() {
        let mut alloc = LiquidAllocation::new(
            MaterialId::new("water"),
            5.0,
            "well",
            "kitchen",
            ItemTypeId::new("bucket"),
        );

        alloc.release();
        alloc.release();
        assert!(!alloc.is_live());
    }
}
