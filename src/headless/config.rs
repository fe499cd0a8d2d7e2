//! JSON configuration parsing for headless mode
//!
//! Parses JSON encounter configurations: who fights the boss, for how long,
//! and with which tuning.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::controller::tuning::{load_boss_tuning, BossTuning, ConfigError};

/// Most challengers a single encounter accepts
pub const MAX_CHALLENGERS: usize = 8;

/// One scripted opponent of the boss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengerConfig {
    /// Display name, unique within the match
    pub name: String,
    #[serde(default = "default_health")]
    pub health: f32,
    /// Damage per landed attack, before the gate
    #[serde(default = "default_attack_damage")]
    pub attack_damage: f32,
    /// Steps between attacks
    #[serde(default = "default_attack_interval")]
    pub attack_interval: u32,
    #[serde(default = "default_attack_range")]
    pub attack_range: f32,
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    /// Carries a guard that mitigates the void beam
    #[serde(default)]
    pub guards: bool,
    #[serde(default = "default_guard_durability")]
    pub guard_durability: u32,
    /// Ranged challengers back off to this distance (0 = melee)
    #[serde(default)]
    pub keep_distance: f32,
    /// Spawn point; defaults to a ring around the boss
    #[serde(default)]
    pub spawn: Option<[f32; 3]>,
}

impl ChallengerConfig {
    /// Melee challenger with default stats
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            health: default_health(),
            attack_damage: default_attack_damage(),
            attack_interval: default_attack_interval(),
            attack_range: default_attack_range(),
            move_speed: default_move_speed(),
            guards: false,
            guard_durability: default_guard_durability(),
            keep_distance: 0.0,
            spawn: None,
        }
    }
}

fn default_health() -> f32 {
    20.0
}

fn default_attack_damage() -> f32 {
    7.0
}

fn default_attack_interval() -> u32 {
    12
}

fn default_attack_range() -> f32 {
    3.0
}

fn default_move_speed() -> f32 {
    0.28
}

fn default_guard_durability() -> u32 {
    336
}

/// Headless match configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessMatchConfig {
    /// Opponents of the boss (1-8)
    pub challengers: Vec<ChallengerConfig>,
    /// Maximum match length in steps (default: 6000)
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    /// Random seed for deterministic match reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Custom output path for the match log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// RON tuning file for the boss; built-in defaults when absent
    #[serde(default)]
    pub tuning_path: Option<String>,
    /// Radius of the square arena
    #[serde(default = "default_arena_half_extent")]
    pub arena_half_extent: f32,
    /// Line-of-sight blocking pillars as `[x, z, radius]`
    #[serde(default)]
    pub pillars: Vec<[f32; 3]>,
}

fn default_max_ticks() -> u64 {
    6000
}

fn default_arena_half_extent() -> f32 {
    30.0
}

impl HeadlessMatchConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: HeadlessMatchConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.challengers.is_empty() || self.challengers.len() > MAX_CHALLENGERS {
            return Err(ConfigError::Invalid(format!(
                "challengers must have 1-{} members",
                MAX_CHALLENGERS
            )));
        }

        for (i, challenger) in self.challengers.iter().enumerate() {
            if challenger.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "challenger {} has an empty name",
                    i
                )));
            }
            if self.challengers[..i]
                .iter()
                .any(|other| other.name == challenger.name)
            {
                return Err(ConfigError::Invalid(format!(
                    "duplicate challenger name '{}'",
                    challenger.name
                )));
            }
            if challenger.health <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{}: health must be positive",
                    challenger.name
                )));
            }
            if challenger.attack_interval == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{}: attack_interval must be at least 1",
                    challenger.name
                )));
            }
            if challenger.attack_damage < 0.0
                || challenger.attack_range <= 0.0
                || challenger.move_speed < 0.0
                || challenger.keep_distance < 0.0
            {
                return Err(ConfigError::Invalid(format!(
                    "{}: damage, range, speed and keep_distance must not be negative",
                    challenger.name
                )));
            }
        }

        if self.max_ticks == 0 {
            return Err(ConfigError::Invalid("max_ticks must be positive".to_string()));
        }
        if self.arena_half_extent < 5.0 {
            return Err(ConfigError::Invalid(
                "arena_half_extent must be at least 5".to_string(),
            ));
        }
        if self.pillars.iter().any(|p| p[2] <= 0.0) {
            return Err(ConfigError::Invalid(
                "pillar radius must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Boss tuning for this match
    pub fn load_tuning(&self) -> Result<BossTuning, ConfigError> {
        match &self.tuning_path {
            Some(path) => load_boss_tuning(Path::new(path)),
            None => {
                debug!("No tuning path, using built-in boss tuning");
                Ok(BossTuning::default())
            }
        }
    }
}
