//! Goal Definitions
//!
//! Static templates describing what a goal is: the ordered action names
//! to run, whether it may be preempted, and the selectors that make it
//! eligible during goal selection. Definitions are data only; the live
//! per-agent execution state lives in [`crate::goals::assigned`].

use bevy_ecs::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use colony_messages::{GoalId, ScheduleCategory};

use crate::actions::ActionRegistry;
use crate::components::{AgentMemory, MemoryKind, Needs};
use crate::error::CoreError;

/// A predicate over an agent's current state, checked during goal
/// selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorCondition {
    /// Matches while the named need is below the threshold.
    NeedBelow { need: NeedKind, threshold: f32 },
    /// Matches while the named need is at or above the threshold.
    NeedAbove { need: NeedKind, threshold: f32 },
    /// Matches while the hour of day is in `[start, end)`.
    HourBetween { start: f32, end: f32 },
    /// Matches while the agent remembers something of this kind.
    MemoryPresent(MemoryKind),
}

/// Which need a selector condition reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedKind {
    Hunger,
    Rest,
}

impl SelectorCondition {
    pub fn matches(&self, hour: f32, needs: &Needs, memory: &AgentMemory) -> bool {
        match self {
            Self::NeedBelow { need, threshold } => need.level(needs) < *threshold,
            Self::NeedAbove { need, threshold } => need.level(needs) >= *threshold,
            Self::HourBetween { start, end } => hour >= *start && hour < *end,
            Self::MemoryPresent(kind) => memory.contains(*kind),
        }
    }
}

impl NeedKind {
    fn level(&self, needs: &Needs) -> f32 {
        match self {
            Self::Hunger => needs.hunger,
            Self::Rest => needs.rest,
        }
    }
}

/// One way a goal can become eligible. A goal may carry several
/// selectors with different priorities.
#[derive(Debug, Clone)]
pub struct GoalSelector {
    pub priority: i32,
    pub schedule: ScheduleCategory,
    pub conditions: Vec<SelectorCondition>,
}

impl GoalSelector {
    pub fn new(priority: i32, schedule: ScheduleCategory) -> Self {
        Self {
            priority,
            schedule,
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: SelectorCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// True when the schedule block is active and every condition holds.
    pub fn matches(&self, hour: f32, needs: &Needs, memory: &AgentMemory) -> bool {
        self.schedule.is_active(hour)
            && self.conditions.iter().all(|c| c.matches(hour, needs, memory))
    }
}

/// Static description of a goal: its action sequence and eligibility.
#[derive(Debug, Clone)]
pub struct GoalDefinition {
    pub id: GoalId,
    pub name: String,
    /// Registry names of the actions to run, in order.
    pub action_names: Vec<&'static str>,
    /// Whether external events may preempt this goal once running.
    pub interruptible: bool,
    pub selectors: Vec<GoalSelector>,
}

impl GoalDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: GoalId::new(id),
            name: name.into(),
            action_names: Vec::new(),
            interruptible: true,
            selectors: Vec::new(),
        }
    }

    pub fn with_actions(mut self, names: Vec<&'static str>) -> Self {
        self.action_names = names;
        self
    }

    pub fn non_interruptible(mut self) -> Self {
        self.interruptible = false;
        self
    }

    pub fn with_selector(mut self, selector: GoalSelector) -> Self {
        self.selectors.push(selector);
        self
    }
}

/// Resource: every goal definition known to the simulation.
#[derive(Resource, Debug, Default)]
pub struct GoalLibrary {
    definitions: HashMap<GoalId, Arc<GoalDefinition>>,
}

impl GoalLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: GoalDefinition) {
        self.definitions
            .insert(definition.id.clone(), Arc::new(definition));
    }

    pub fn get(&self, id: &GoalId) -> Option<Arc<GoalDefinition>> {
        self.definitions.get(id).cloned()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Arc<GoalDefinition>> {
        self.definitions.values()
    }

    /// Checks every definition against the registry at startup: empty
    /// action lists and unknown action names are configuration mistakes
    /// that must not surface mid-simulation.
    pub fn validate(&self, registry: &ActionRegistry) -> Result<(), CoreError> {
        for definition in self.definitions.values() {
            if definition.action_names.is_empty() {
                return Err(CoreError::InvalidGoalDefinition {
                    goal: definition.id.clone(),
                    reason: "no actions".to_string(),
                });
            }
            for name in &definition.action_names {
                if !registry.contains(name) {
                    return Err(CoreError::InvalidGoalDefinition {
                        goal: definition.id.clone(),
                        reason: format!("unknown action '{}'", name),
                    });
                }
            }
        }
        Ok(())
    }

    /// The standard goal set for the demo settlement.
    pub fn with_builtin_goals() -> Self {
        let mut library = Self::new();

        library.register(
            GoalDefinition::new("respond_to_threat", "Respond to Threat")
                .with_actions(vec!["attack_target"])
                .non_interruptible()
                .with_selector(
                    GoalSelector::new(10, ScheduleCategory::Any).with_condition(
                        SelectorCondition::MemoryPresent(MemoryKind::ThreatSighted),
                    ),
                ),
        );

        library.register(
            GoalDefinition::new("sleep", "Sleep")
                .with_actions(vec!["sleep"])
                .with_selector(
                    GoalSelector::new(8, ScheduleCategory::Rest).with_condition(
                        SelectorCondition::NeedBelow {
                            need: NeedKind::Rest,
                            threshold: 0.3,
                        },
                    ),
                ),
        );

        library.register(
            GoalDefinition::new("fetch_liquid", "Fetch Liquid")
                .with_actions(vec![
                    "request_liquid_transfer",
                    "go_to_location",
                    "drink_fetched_liquid",
                    "cancel_liquid_allocation",
                ])
                .with_selector(
                    GoalSelector::new(7, ScheduleCategory::Any).with_condition(
                        SelectorCondition::NeedBelow {
                            need: NeedKind::Hunger,
                            threshold: 0.35,
                        },
                    ),
                ),
        );

        library.register(
            GoalDefinition::new("haul_goods", "Haul Goods")
                .with_actions(vec![
                    "request_hauling_allocation",
                    "go_to_location",
                    "pick_up_hauled_item",
                    "cancel_hauling_allocation",
                ])
                .with_selector(
                    GoalSelector::new(6, ScheduleCategory::Work).with_condition(
                        SelectorCondition::HourBetween {
                            start: 8.0,
                            end: 13.0,
                        },
                    ),
                ),
        );

        library.register(
            GoalDefinition::new("find_work", "Find Work")
                .with_actions(vec!["select_job", "work_on_job"])
                .with_selector(GoalSelector::new(5, ScheduleCategory::Work)),
        );

        library
    }
}
