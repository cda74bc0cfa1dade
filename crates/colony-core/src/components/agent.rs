//! Agent Components
//!
//! Components for settler agents: identity, needs, inventory, and the short
//! "relevant memory" that goal selectors and combat actions read. The engine
//! holds references to agents, it never owns them.

use bevy_ecs::prelude::*;
use colony_messages::{AgentId, ItemTypeId};
use serde::{Deserialize, Serialize};

/// Component: agent identity.
#[derive(Component, Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    /// Profession restricts which jobs the agent will take.
    pub profession: Option<String>,
}

impl Agent {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(id),
            name: name.into(),
            profession: None,
        }
    }

    pub fn with_profession(mut self, profession: impl Into<String>) -> Self {
        self.profession = Some(profession.into());
        self
    }
}

/// Component: agent needs in [0, 1]; low values drive goal selection.
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Needs {
    pub hunger: f32,
    pub rest: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            hunger: 1.0,
            rest: 1.0,
        }
    }
}

impl Needs {
    /// Lowers a need by the given amount, clamped at zero.
    pub fn decay(value: &mut f32, amount: f32) {
        *value = (*value - amount).max(0.0);
    }

    /// Raises a need by the given amount, clamped at one.
    pub fn restore(value: &mut f32, amount: f32) {
        *value = (*value + amount).min(1.0);
    }
}

/// A weapon held in the agent's weapon slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub item_type: ItemTypeId,
    /// Ranged weapons are useless without ammunition.
    pub requires_ammo: bool,
}

impl Weapon {
    pub fn melee(item_type: impl Into<String>) -> Self {
        Self {
            item_type: ItemTypeId::new(item_type),
            requires_ammo: false,
        }
    }

    pub fn ranged(item_type: impl Into<String>) -> Self {
        Self {
            item_type: ItemTypeId::new(item_type),
            requires_ammo: true,
        }
    }
}

/// Component: what the agent carries.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub weapon: Option<Weapon>,
    /// Rounds for the equipped weapon, if it needs any.
    pub ammo: u32,
    /// Item types currently being carried (hauled goods, containers).
    pub carried: Vec<ItemTypeId>,
}

impl Inventory {
    /// True if the agent could fight right now: an equipped weapon, with
    /// ammunition if the weapon needs it.
    pub fn has_usable_weapon(&self) -> bool {
        match &self.weapon {
            Some(weapon) => !weapon.requires_ammo || self.ammo > 0,
            None => false,
        }
    }
}

/// Kind of remembered fact. Goal selectors match on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// A hostile was seen; drives the threat-response goal.
    ThreatSighted,
    /// A job was left half-done by an interruption.
    UnfinishedJob,
    /// The agent has claimed a bed.
    ClaimedBed,
}

/// One remembered fact with the tick it was formed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub kind: MemoryKind,
    pub tick: u64,
}

/// Component: the agent's short-term relevant memory.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMemory {
    entries: Vec<MemoryEntry>,
}

impl AgentMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fact; a kind is remembered at most once, the newest tick
    /// wins.
    pub fn remember(&mut self, kind: MemoryKind, tick: u64) {
        self.forget(kind);
        self.entries.push(MemoryEntry { kind, tick });
    }

    pub fn forget(&mut self, kind: MemoryKind) {
        self.entries.retain(|e| e.kind != kind);
    }

    pub fn contains(&self, kind: MemoryKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    pub fn get(&self, kind: MemoryKind) -> Option<&MemoryEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Drops entries that have reached the given age in ticks. Memories
    /// nothing acted on eventually stop driving goal selection.
    pub fn expire(&mut self, now_tick: u64, ttl_ticks: u64) {
        self.entries
            .retain(|e| now_tick.saturating_sub(e.tick) < ttl_ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_weapon() {
        let mut inv = Inventory::default();
        assert!(!inv.has_usable_weapon());

        inv.weapon = Some(Weapon::melee("sword"));
        assert!(inv.has_usable_weapon());

        inv.weapon = Some(Weapon::ranged("crossbow"));
        assert!(!inv.has_usable_weapon());

        inv.ammo = 5;
        assert!(inv.has_usable_weapon());
    }

    #[test]
    fn test_memory_deduplicates_by_kind() {
        let mut memory = AgentMemory::new();
        memory.remember(MemoryKind::ThreatSighted, 10);
        memory.remember(MemoryKind::ThreatSighted, 20);

        assert_eq!(memory.entries().len(), 1);
        assert_eq!(memory.get(MemoryKind::ThreatSighted).unwrap().tick, 20);

        memory.forget(MemoryKind::ThreatSighted);
        assert!(!memory.contains(MemoryKind::ThreatSighted));
    }

    #[test]
    fn test_memory_expiry() {
        let mut memory = AgentMemory::new();
        memory.remember(MemoryKind::ThreatSighted, 100);
        memory.remember(MemoryKind::ClaimedBed, 150);

        memory.expire(179, 80);
        assert!(memory.contains(MemoryKind::ThreatSighted));

        memory.expire(180, 80);
        assert!(!memory.contains(MemoryKind::ThreatSighted));
        assert!(memory.contains(MemoryKind::ClaimedBed));
    }

    #[test]
    fn test_needs_clamping() {
        let mut needs = Needs::default();
        Needs::decay(&mut needs.hunger, 1.5);
        assert_eq!(needs.hunger, 0.0);

        Needs::restore(&mut needs.hunger, 2.0);
        assert_eq!(needs.hunger, 1.0);
    }
}
