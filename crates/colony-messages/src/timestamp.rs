//! Simulation Time Types
//!
//! Handles simulation time with both tick-based and human-readable formats.
//!
//! # Example
//!
//! ```
//! use colony_messages::WorldTime;
//!
//! let time = WorldTime::from_tick(360);
//! assert_eq!(time.day(), 1);
//! assert_eq!(time.to_string(), "day_1.hour_09");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of ticks per simulated day.
pub const TICKS_PER_DAY: u64 = 960;

/// Number of hours per simulated day.
pub const HOURS_PER_DAY: f32 = 24.0;

/// A point in simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldTime {
    pub tick: u64,
}

impl WorldTime {
    pub fn from_tick(tick: u64) -> Self {
        Self { tick }
    }

    /// Day number, starting at 1.
    pub fn day(&self) -> u64 {
        self.tick / TICKS_PER_DAY + 1
    }

    /// Hour within the current day, in [0, 24).
    pub fn hour_of_day(&self) -> f32 {
        let tick_of_day = self.tick % TICKS_PER_DAY;
        tick_of_day as f32 / TICKS_PER_DAY as f32 * HOURS_PER_DAY
    }
}

impl fmt::Display for WorldTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day_{}.hour_{:02}", self.day(), self.hour_of_day() as u32)
    }
}

/// Daily schedule block a goal selector applies to.
///
/// Selectors are gated on the block that is active at the current hour;
/// `Any` selectors match around the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleCategory {
    #[default]
    Any,
    /// Working hours: 08:00 - 18:00
    Work,
    /// Sleeping hours: 22:00 - 06:00 (wraps midnight)
    Rest,
    /// Everything else: 06:00 - 08:00 and 18:00 - 22:00
    Leisure,
}

impl ScheduleCategory {
    /// Returns true if this block is active at the given hour of day.
    pub fn is_active(&self, hour: f32) -> bool {
        match self {
            ScheduleCategory::Any => true,
            ScheduleCategory::Work => (8.0..18.0).contains(&hour),
            ScheduleCategory::Rest => !(6.0..22.0).contains(&hour),
            ScheduleCategory::Leisure => {
                (6.0..8.0).contains(&hour) || (18.0..22.0).contains(&hour)
            }
        }
    }
}
