//! Hauling Allocation Types
//!
//! A hauling allocation reserves one item (or stack) for one agent to carry
//! from its origin to wherever the owning goal needs it. The holding goal is
//! the only writer; releasing an already-released allocation is a no-op so
//! abandonment cascades can release freely.

use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, AllocationId, ItemTypeId, MaterialId};

/// Reservation of an item for hauling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaulingAllocation {
    pub id: AllocationId,
    pub item_type: ItemTypeId,
    pub material: MaterialId,
    /// Location the item is hauled from.
    pub origin_location: String,
    /// Agent currently holding the reservation.
    pub owner: Option<AgentId>,
    /// Set once released; further releases are no-ops.
    pub cancelled: bool,
}

impl HaulingAllocation {
    pub fn new(
        item_type: ItemTypeId,
        material: MaterialId,
        origin_location: impl Into<String>,
    ) -> Self {
        Self {
            id: AllocationId::generate(),
            item_type,
            material,
            origin_location: origin_location.into(),
            owner: None,
            cancelled: false,
        }
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
