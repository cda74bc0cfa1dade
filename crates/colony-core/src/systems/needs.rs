//! Needs System
//!
//! Passive decay of agent needs. Restoration happens inside actions
//! (sleeping, drinking), never here.

use bevy_ecs::prelude::*;

use crate::components::{Needs, WorldClock};
use crate::config::Config;

/// System: decay hunger and rest by the configured hourly rates.
pub fn decay_needs(
    clock: Res<WorldClock>,
    config: Res<Config>,
    mut query: Query<&mut Needs>,
) {
    let hours = clock.seconds_per_tick / 3600.0;
    for mut needs in query.iter_mut() {
        Needs::decay(&mut needs.hunger, config.needs.hunger_decay_per_hour * hours);
        Needs::decay(&mut needs.rest, config.needs.rest_decay_per_hour * hours);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_clamps_at_zero() {
        let mut needs = Needs::default();
        Needs::decay(&mut needs.hunger, 2.0);
        assert_eq!(needs.hunger, 0.0);
    }
}
