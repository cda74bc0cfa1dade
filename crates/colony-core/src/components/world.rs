//! World Components
//!
//! The agent position component and the simulated clock resource.

use bevy_ecs::prelude::*;
use colony_messages::WorldTime;
use serde::{Deserialize, Serialize};

/// Component: an agent's current position in the settlement.
///
/// Navigation internals are out of scope; a position is just a named
/// location and travel is modeled as elapsed time.
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub location_id: String,
}

impl Position {
    pub fn new(location_id: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
        }
    }
}

/// Resource: the simulation clock.
#[derive(Resource, Debug, Clone)]
pub struct WorldClock {
    pub time: WorldTime,
    /// Simulated seconds each tick advances; the deltaTime handed to
    /// actions.
    pub seconds_per_tick: f32,
}

impl WorldClock {
    pub fn new(seconds_per_tick: f32) -> Self {
        Self {
            time: WorldTime::default(),
            seconds_per_tick,
        }
    }

    pub fn advance(&mut self) {
        self.time.tick += 1;
    }

    pub fn tick(&self) -> u64 {
        self.time.tick
    }

    pub fn hour_of_day(&self) -> f32 {
        self.time.hour_of_day()
    }

    pub fn formatted(&self) -> String {
        self.time.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances() {
        let mut clock = WorldClock::new(90.0);
        assert_eq!(clock.tick(), 0);
        clock.advance();
        assert_eq!(clock.tick(), 1);
    }
}
