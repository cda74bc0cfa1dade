//! Goal Persistence
//!
//! Save and restore of in-flight goals. Saves are sparse: default
//! fields are omitted, an action with no state of its own contributes
//! only its name, and shared records (jobs, allocations) are written as
//! ids and resolved against the live ledgers on load. A save that
//! references a record the ledgers no longer hold is rejected rather
//! than patched up.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use colony_messages::{
    AllocationId, FurnitureId, GoalId, HaulingAllocation, Job, JobId, LiquidAllocation,
};

use crate::actions::ActionRegistry;
use crate::bus::MessageBus;
use crate::components::MemoryEntry;
use crate::error::CoreError;
use crate::goals::assigned::{AssignedGoal, GoalState};
use crate::goals::definition::GoalLibrary;
use crate::goals::queue::ActionQueue;

/// One action in a saved queue: its registry name plus whatever state
/// it chose to write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAction {
    pub name: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub state: Value,
}

/// The shared goal state, reduced to ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedGoalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_job: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hauling_allocation: Option<AllocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid_allocation: Option<AllocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_furniture: Option<FurnitureId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_location: Option<String>,
    /// The memory entry the goal was acting on, stored by value; memory
    /// entries live on the agent, not in a ledger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_memory: Option<MemoryEntry>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub interrupted: bool,
}

/// A complete saved goal: definition id, shared state, and the
/// remaining queue in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGoal {
    pub goal_id: GoalId,
    #[serde(default)]
    pub state: SavedGoalState,
    pub actions: Vec<SavedAction>,
}

/// Resolves saved ids back to live records during restore.
#[derive(Debug, Default)]
pub struct SaveLookup {
    jobs: HashMap<JobId, Job>,
    hauling: HashMap<AllocationId, HaulingAllocation>,
    liquid: HashMap<AllocationId, LiquidAllocation>,
    furniture: HashSet<FurnitureId>,
}

impl SaveLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots the resolvable records from the bus ledgers.
    pub fn from_bus(bus: &MessageBus) -> Self {
        let mut lookup = Self::new();
        for job in bus.job_board.jobs() {
            lookup.jobs.insert(job.id.clone(), job.clone());
        }
        for allocation in bus.hauling.allocations() {
            lookup
                .hauling
                .insert(allocation.id.clone(), allocation.clone());
        }
        for allocation in bus.liquid.allocations() {
            lookup
                .liquid
                .insert(allocation.id.clone(), allocation.clone());
        }
        lookup
    }

    pub fn register_furniture(&mut self, id: FurnitureId) {
        self.furniture.insert(id);
    }

    pub fn job(&self, id: &JobId) -> Result<Job, CoreError> {
        self.jobs.get(id).cloned().ok_or(CoreError::MissingReference {
            kind: "job",
            id: id.to_string(),
        })
    }

    pub fn hauling_allocation(
        &self,
        id: &AllocationId,
    ) -> Result<HaulingAllocation, CoreError> {
        self.hauling
            .get(id)
            .cloned()
            .ok_or(CoreError::MissingReference {
                kind: "hauling allocation",
                id: id.to_string(),
            })
    }

    pub fn liquid_allocation(
        &self,
        id: &AllocationId,
    ) -> Result<LiquidAllocation, CoreError> {
        self.liquid
            .get(id)
            .cloned()
            .ok_or(CoreError::MissingReference {
                kind: "liquid allocation",
                id: id.to_string(),
            })
    }

    pub fn furniture(&self, id: &FurnitureId) -> Result<FurnitureId, CoreError> {
        if self.furniture.contains(id) {
            Ok(id.clone())
        } else {
            Err(CoreError::MissingReference {
                kind: "furniture",
                id: id.to_string(),
            })
        }
    }
}

/// Serializes a goal's remaining queue and shared state.
pub fn save_goal(goal: &AssignedGoal) -> SavedGoal {
    let actions = goal
        .queue()
        .iter()
        .map(|action| SavedAction {
            name: action.name().to_string(),
            state: action.write_state(),
        })
        .collect();

    let state = &goal.state;
    SavedGoal {
        goal_id: goal.goal_id().clone(),
        state: SavedGoalState {
            assigned_job: state.assigned_job.as_ref().map(|j| j.id.clone()),
            hauling_allocation: state.hauling_allocation.as_ref().map(|a| a.id.clone()),
            liquid_allocation: state.liquid_allocation.as_ref().map(|a| a.id.clone()),
            assigned_furniture: state.assigned_furniture.clone(),
            target_location: state.target_location.clone(),
            relevant_memory: state.relevant_memory.clone(),
            interrupted: state.interrupted,
        },
        actions,
    }
}

/// Rebuilds a goal from a save. Every referenced record must still be
/// resolvable; a dangling id fails the whole restore.
pub fn restore_goal(
    saved: &SavedGoal,
    library: &GoalLibrary,
    registry: &ActionRegistry,
    lookup: &SaveLookup,
) -> Result<AssignedGoal, CoreError> {
    let definition = library
        .get(&saved.goal_id)
        .ok_or_else(|| CoreError::UnknownGoal(saved.goal_id.clone()))?;

    let mut state = GoalState {
        target_location: saved.state.target_location.clone(),
        relevant_memory: saved.state.relevant_memory.clone(),
        interrupted: saved.state.interrupted,
        ..GoalState::default()
    };
    if let Some(id) = &saved.state.assigned_job {
        state.assigned_job = Some(lookup.job(id)?);
    }
    if let Some(id) = &saved.state.hauling_allocation {
        state.hauling_allocation = Some(lookup.hauling_allocation(id)?);
    }
    if let Some(id) = &saved.state.liquid_allocation {
        state.liquid_allocation = Some(lookup.liquid_allocation(id)?);
    }
    if let Some(id) = &saved.state.assigned_furniture {
        state.assigned_furniture = Some(lookup.furniture(id)?);
    }

    let mut queue = ActionQueue::new();
    for saved_action in &saved.actions {
        let mut action = registry.resolve(&saved_action.name)?;
        action.read_state(&saved_action.state, lookup)?;
        queue.push_back(action);
    }

    Ok(AssignedGoal::from_parts(definition, queue, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn setup() -> (GoalLibrary, ActionRegistry) {
        (
            GoalLibrary::with_builtin_goals(),
            ActionRegistry::with_builtin_actions(),
        )
    }

    fn instantiate(
        library: &GoalLibrary,
        registry: &ActionRegistry,
        goal: &str,
    ) -> AssignedGoal {
        let definition = library.get(&GoalId::new(goal)).unwrap();
        AssignedGoal::instantiate(definition, registry).unwrap()
    }

    #[test]
    fn test_fresh_goal_saves_sparse() {
        let (library, registry) = setup();
        let goal = instantiate(&library, &registry, "find_work");

        let saved = save_goal(&goal);
        let json = serde_json::to_value(&saved).unwrap();

        // Untouched actions and default state write no payload
        assert_eq!(
            json,
            serde_json::json!({
                "goal_id": "find_work",
                "state": {},
                "actions": [
                    {"name": "select_job"},
                    {"name": "work_on_job"},
                ],
            })
        );
    }

    #[test]
    fn test_round_trip_preserves_queue_and_state() {
        let (library, registry) = setup();
        let mut goal = instantiate(&library, &registry, "find_work");
        goal.state.target_location = Some("sawmill".to_string());

        let saved = save_goal(&goal);
        let lookup = SaveLookup::new();
        let restored = restore_goal(&saved, &library, &registry, &lookup).unwrap();

        assert_eq!(restored.goal_id(), goal.goal_id());
        assert_eq!(restored.current_action_name(), Some("select_job"));
        assert_eq!(restored.state.target_location.as_deref(), Some("sawmill"));
    }

    #[test]
    fn test_relevant_memory_round_trips_by_value() {
        use crate::components::{MemoryEntry, MemoryKind};

        let (library, registry) = setup();
        let mut goal = instantiate(&library, &registry, "respond_to_threat");
        goal.state.relevant_memory = Some(MemoryEntry {
            kind: MemoryKind::ThreatSighted,
            tick: 12,
        });

        let saved = save_goal(&goal);
        let json = serde_json::to_value(&saved).unwrap();
        assert_eq!(json["state"]["relevant_memory"]["tick"], 12);

        let restored = restore_goal(&saved, &library, &registry, &SaveLookup::new()).unwrap();
        assert_eq!(
            restored.state.relevant_memory,
            goal.state.relevant_memory
        );
    }

    #[test]
    fn test_dangling_job_reference_fails_restore() {
        let (library, registry) = setup();
        let saved = SavedGoal {
            goal_id: GoalId::new("find_work"),
            state: SavedGoalState {
                assigned_job: Some(JobId::new("job_gone")),
                ..SavedGoalState::default()
            },
            actions: vec![SavedAction {
                name: "work_on_job".to_string(),
                state: Value::Null,
            }],
        };

        let result = restore_goal(&saved, &library, &registry, &SaveLookup::new());
        assert!(matches!(
            result,
            Err(CoreError::MissingReference { kind: "job", .. })
        ));
    }

    #[test]
    fn test_unknown_goal_fails_restore() {
        let (library, registry) = setup();
        let saved = SavedGoal {
            goal_id: GoalId::new("no_such_goal"),
            state: SavedGoalState::default(),
            actions: vec![],
        };
        let result = restore_goal(&saved, &library, &registry, &SaveLookup::new());
        assert!(matches!(result, Err(CoreError::UnknownGoal(_))));
    }

    #[test]
    fn test_lookup_resolves_from_bus() {
        use colony_messages::Job;

        let mut bus = MessageBus::new();
        let job = Job::new("saw_planks");
        let job_id = job.id.clone();
        bus.job_board.post(job);

        let lookup = SaveLookup::from_bus(&bus);
        assert!(lookup.job(&job_id).is_ok());
        assert!(lookup.job(&JobId::new("other")).is_err());
    }

    #[test]
    fn test_saved_queue_keeps_only_remaining_actions() {
        let (library, registry) = setup();
        let definition = library.get(&GoalId::new("fetch_liquid")).unwrap();
        let mut goal = AssignedGoal::instantiate(Arc::clone(&definition), &registry).unwrap();
        goal.queue_mut().pop_current();

        let saved = save_goal(&goal);
        let names: Vec<&str> = saved.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["go_to_location", "drink_fetched_liquid", "cancel_liquid_allocation"]
        );
    }
}
