//! Goal Selection
//!
//! Picks the next goal for an idle agent: every selector across the
//! library is considered in descending priority, and the first whose
//! schedule block is active and whose conditions all hold wins.

use colony_messages::GoalId;

use crate::components::{AgentMemory, Needs};
use crate::goals::definition::GoalLibrary;

/// Selects the highest-priority eligible goal, or `None` to idle.
/// Goal id order breaks priority ties so selection is deterministic.
pub fn select_goal(
    library: &GoalLibrary,
    hour: f32,
    needs: &Needs,
    memory: &AgentMemory,
) -> Option<GoalId> {
    let mut candidates: Vec<(i32, &GoalId)> = Vec::new();
    for definition in library.definitions() {
        for selector in &definition.selectors {
            if selector.matches(hour, needs, memory) {
                candidates.push((selector.priority, &definition.id));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.as_str().cmp(b.1.as_str())));
    candidates.first().map(|(_, id)| (*id).clone())
}
