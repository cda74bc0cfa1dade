//! Configuration System
//!
//! Loads tuning parameters from tuning.toml for easy adjustment without
//! recompiling.

use bevy_ecs::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Resource, Debug, Clone, Deserialize)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub goals: GoalConfig,
    pub needs: NeedsConfig,
    pub travel: TravelConfig,
    pub combat: CombatConfig,
    pub sleep: SleepConfig,
    pub hauling: HaulingConfig,
    pub liquid: LiquidConfig,
    pub jobs: JobsConfig,
    pub memory: MemoryConfig,
}

/// Simulation parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub default_ticks: u64,
    /// Simulated seconds each tick advances.
    pub seconds_per_tick: f32,
}

/// Goal execution parameters
#[derive(Debug, Clone, Deserialize)]
pub struct GoalConfig {
    /// How long an action waits on an unanswered bus request before it
    /// fails and cancels the request.
    pub request_timeout_seconds: f32,
}

/// Need decay rates
#[derive(Debug, Clone, Deserialize)]
pub struct NeedsConfig {
    pub hunger_decay_per_hour: f32,
    pub rest_decay_per_hour: f32,
}

/// Travel parameters
#[derive(Debug, Clone, Deserialize)]
pub struct TravelConfig {
    /// Seconds to walk one leg (navigation internals are out of scope, so
    /// every trip is one leg).
    pub seconds_per_leg: f32,
}

/// Combat action phase durations
#[derive(Debug, Clone, Deserialize)]
pub struct CombatConfig {
    pub aim_seconds: f32,
    pub strike_seconds: f32,
    pub recover_seconds: f32,
    /// Strikes needed to clear a threat.
    pub strikes_to_clear: u32,
}

/// Sleep action parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SleepConfig {
    pub rest_restored_per_hour: f32,
    /// Rest level at which the sleeper wakes naturally.
    pub wake_threshold: f32,
}

/// Hauling action parameters
#[derive(Debug, Clone, Deserialize)]
pub struct HaulingConfig {
    pub pickup_seconds: f32,
}

/// Liquid action parameters
#[derive(Debug, Clone, Deserialize)]
pub struct LiquidConfig {
    pub fetch_amount_litres: f32,
    pub drink_seconds: f32,
    /// Liquid material agents fetch to drink.
    pub material: String,
    pub container_item_type: String,
}

/// Agent memory parameters
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Simulated hours before a remembered fact fades on its own.
    pub ttl_hours: f32,
}

/// Demo-world job board parameters
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Ticks between batches of new jobs on the board.
    pub post_interval_ticks: u64,
    /// Ticks between threat sightings.
    pub threat_interval_ticks: u64,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from the given path, or use defaults if not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path.as_ref()).unwrap_or_else(|e| {
            eprintln!(
                "Warning: Could not load {}: {}. Using defaults.",
                path.as_ref().display(),
                e
            );
            Self::default()
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig {
                default_ticks: 2000,
                seconds_per_tick: 90.0,
            },
            goals: GoalConfig {
                request_timeout_seconds: 300.0,
            },
            needs: NeedsConfig {
                hunger_decay_per_hour: 0.03,
                rest_decay_per_hour: 0.05,
            },
            travel: TravelConfig {
                seconds_per_leg: 180.0,
            },
            combat: CombatConfig {
                aim_seconds: 2.0,
                strike_seconds: 1.0,
                recover_seconds: 3.0,
                strikes_to_clear: 3,
            },
            sleep: SleepConfig {
                rest_restored_per_hour: 0.12,
                wake_threshold: 0.95,
            },
            hauling: HaulingConfig {
                pickup_seconds: 30.0,
            },
            liquid: LiquidConfig {
                fetch_amount_litres: 5.0,
                drink_seconds: 20.0,
                material: "water".to_string(),
                container_item_type: "bucket".to_string(),
            },
            jobs: JobsConfig {
                post_interval_ticks: 40,
                threat_interval_ticks: 450,
            },
            memory: MemoryConfig { ttl_hours: 2.0 },
        }
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
