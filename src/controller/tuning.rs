//! Boss tuning
//!
//! Every number the controller uses lives here, grouped by subsystem. The
//! defaults are the shipped balance; `assets/config/boss.ron` may override any
//! subset of them (missing fields keep their default).
//!
//! All durations are in simulation steps. Distances are in world units.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default location of the tuning file, relative to the working directory
pub const DEFAULT_TUNING_PATH: &str = "assets/config/boss.ron";

/// Errors raised while loading or validating configuration files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// RON parsing failed
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// A value was parsed but is out of its allowed range
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Complete tuning for one boss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BossTuning {
    pub stats: StatTuning,
    pub gate: GateTuning,
    pub beam: BeamTuning,
    pub grab: GrabTuning,
    pub burst: BurstTuning,
    pub melee: MeleeTuning,
    pub phase: PhaseTuning,
    pub watchdog: WatchdogTuning,
}

/// Base attributes and locomotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatTuning {
    pub max_health: f32,
    pub attack_damage: f32,
    /// Walking speed per step
    pub move_speed: f32,
    /// Speed used while chasing a distant target
    pub run_speed: f32,
    /// Chasing switches to running beyond this distance
    pub run_distance: f32,
    /// Chasing stops inside this distance
    pub chase_stop_distance: f32,
    pub follow_range: f32,
    /// Wander speed as a fraction of `move_speed`
    pub wander_speed_factor: f32,
    pub wander_chance: f32,
    pub wander_radius: f32,
    pub wander_max_ticks: u32,
}

impl Default for StatTuning {
    fn default() -> Self {
        Self {
            max_health: 200.0,
            attack_damage: 15.0,
            move_speed: 0.3,
            run_speed: 0.45,
            run_distance: 8.0,
            chase_stop_distance: 2.0,
            follow_range: 40.0,
            wander_speed_factor: 0.8,
            wander_chance: 1.0 / 120.0,
            wander_radius: 8.0,
            wander_max_ticks: 100,
        }
    }
}

/// Invulnerability window and chunk damage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateTuning {
    /// Window length after a hit opens the gate
    pub invulnerable_ticks_base: u32,
    /// Window reduction while berserk
    pub berserk_reduction: u32,
    /// The window never opens shorter than this
    pub min_invulnerable_ticks: u32,
    /// Fixed damage taken by the hit that opens the gate
    pub taken_damage: f32,
    /// Damage applied when a window with a pending chunk closes
    pub chunk_damage: f32,
    /// Raw hits at or above this schedule a chunk
    pub chunk_threshold: f32,
    /// Consecutive qualifying hits that force health to zero
    pub hit_cap: u32,
    /// Minimum steps between gate feedback cues
    pub feedback_cooldown: u32,
}

impl Default for GateTuning {
    fn default() -> Self {
        Self {
            invulnerable_ticks_base: 40,
            berserk_reduction: 10,
            min_invulnerable_ticks: 20,
            taken_damage: 20.0,
            chunk_damage: 30.0,
            chunk_threshold: 30.0,
            hit_cap: 5,
            feedback_cooldown: 5,
        }
    }
}

/// Ranged beam channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamTuning {
    pub warning_ticks: u32,
    pub charge_ticks: u32,
    pub fire_ticks: u32,
    /// Opening part of the firing window that deals no damage
    pub grace_ticks: u32,
    pub damage_interval: u32,
    pub interval_damage: f32,
    /// Unguarded interval hits kill outright when set
    pub unguarded_lethal: bool,
    pub chip_damage: f32,
    pub guard_durability_cost: u32,
    pub knockback_horizontal: f32,
    pub knockback_vertical: f32,
    /// Hurt immunity granted when the guard breaks
    pub stun_immunity_ticks: u32,
    pub min_range: f32,
    pub range: f32,
    pub cooldown: u32,
    pub splash_radius: f32,
    pub splash_damage: f32,
    pub warning_checkpoint: u32,
    pub charge_cue_interval: u32,
    pub impact_warning_interval: u32,
}

impl Default for BeamTuning {
    fn default() -> Self {
        Self {
            warning_ticks: 40,
            charge_ticks: 60,
            fire_ticks: 80,
            grace_ticks: 15,
            damage_interval: 2,
            interval_damage: 6.0,
            unguarded_lethal: false,
            chip_damage: 3.0,
            guard_durability_cost: 5,
            knockback_horizontal: 0.3,
            knockback_vertical: 0.2,
            stun_immunity_ticks: 20,
            min_range: 8.0,
            range: 120.0,
            cooldown: 200,
            splash_radius: 2.0,
            splash_damage: 4.0,
            warning_checkpoint: 20,
            charge_cue_interval: 10,
            impact_warning_interval: 5,
        }
    }
}

/// Grab and throw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabTuning {
    pub extend_ticks: u32,
    pub reach: f32,
    pub min_distance: f32,
    /// Per-step chance of starting a grab when otherwise eligible
    pub chance: f32,
    pub max_duration: u32,
    pub release_distance: f32,
    /// Fraction of the gap to the anchor closed per step
    pub pull_strength: f32,
    pub hold_distance: f32,
    pub hold_height: f32,
    pub damage: f32,
    pub damage_interval: u32,
    pub throw_after: u32,
    pub throw_chance: f32,
    pub throw_horizontal: f32,
    pub throw_vertical: f32,
    pub throw_damage: f32,
    pub cooldown: u32,
    pub animation_ticks: u32,
}

impl Default for GrabTuning {
    fn default() -> Self {
        Self {
            extend_ticks: 20,
            reach: 10.0,
            min_distance: 4.0,
            chance: 1.0 / 30.0,
            max_duration: 100,
            release_distance: 12.0,
            pull_strength: 0.5,
            hold_distance: 2.0,
            hold_height: 0.5,
            damage: 5.0,
            damage_interval: 20,
            throw_after: 60,
            throw_chance: 0.3,
            throw_horizontal: 2.5,
            throw_vertical: 0.8,
            throw_damage: 10.0,
            cooldown: 60,
            animation_ticks: 80,
        }
    }
}

/// Area burst
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstTuning {
    pub radius: f32,
    pub linger_radius: f32,
    pub charge_ticks: u32,
    pub linger_ticks: u32,
    pub linger_interval: u32,
    pub detonate_damage: f32,
    pub linger_damage: f32,
    pub knockback: f32,
    pub knockback_vertical: f32,
    pub cooldown: u32,
    /// Only selectable at or below this health ratio
    pub health_threshold: f32,
    pub charge_cue_interval: u32,
}

impl Default for BurstTuning {
    fn default() -> Self {
        Self {
            radius: 15.0,
            linger_radius: 10.0,
            charge_ticks: 150,
            linger_ticks: 60,
            linger_interval: 5,
            detonate_damage: 40.0,
            linger_damage: 3.0,
            knockback: 3.0,
            knockback_vertical: 1.5,
            cooldown: 300,
            health_threshold: 0.5,
            charge_cue_interval: 20,
        }
    }
}

/// Slash, left hand, dual slam and the berserk combos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeTuning {
    pub slash_range: f32,
    pub slash_cooldown: u32,
    pub slash_animation: u32,
    pub slash_strike_delay: u32,

    pub left_hand_range: f32,
    pub left_hand_chance: f32,
    pub left_hand_cooldown: u32,
    pub left_hand_animation: u32,
    /// Remaining-animation values on which a left hand hit lands
    pub left_hand_hit_frames: Vec<u32>,
    pub left_hand_combo_max: u32,
    pub left_hand_combo_decay: u32,

    pub dual_slam_range: f32,
    pub dual_slam_chance: f32,
    pub dual_slam_cooldown: u32,
    pub dual_slam_animation: u32,
    pub dual_slam_impact_delay: u32,
    pub dual_slam_damage: f32,
    pub dual_slam_falloff: f32,

    pub combo_range: f32,
    pub combo_hit_range: f32,
    pub combo_leash: f32,
    pub combo_animation: u32,
    pub combo_stages: u32,
    pub combo_stage_interval: u32,
    pub combo_cooldown: u32,
    /// Facing error, in degrees, that makes the combo re-aim instead of striking
    pub combo_max_facing_error: f32,

    pub running_min_distance: f32,
    pub running_max_distance: f32,
    pub running_max_ticks: u32,
    pub running_hit_range: f32,
    pub running_hit_interval: u32,
    pub running_finish_distance: f32,
    pub running_leash: f32,
    pub running_damage_factor: f32,
    /// Speed gained per step while sprinting
    pub running_acceleration: f32,
    pub running_top_speed: f32,
    pub running_cooldown: u32,
}

impl Default for MeleeTuning {
    fn default() -> Self {
        Self {
            slash_range: 3.0,
            slash_cooldown: 25,
            slash_animation: 30,
            slash_strike_delay: 10,

            left_hand_range: 12.0_f32.sqrt(),
            left_hand_chance: 0.2,
            left_hand_cooldown: 10,
            left_hand_animation: 24,
            left_hand_hit_frames: vec![17, 15, 13],
            left_hand_combo_max: 5,
            left_hand_combo_decay: 20,

            dual_slam_range: 4.0,
            dual_slam_chance: 0.02,
            dual_slam_cooldown: 100,
            dual_slam_animation: 40,
            dual_slam_impact_delay: 10,
            dual_slam_damage: 25.0,
            dual_slam_falloff: 5.0,

            combo_range: 4.0,
            combo_hit_range: 3.0,
            combo_leash: 5.0,
            combo_animation: 60,
            combo_stages: 5,
            combo_stage_interval: 10,
            combo_cooldown: 40,
            combo_max_facing_error: 45.0,

            running_min_distance: 4.0,
            running_max_distance: 8.0,
            running_max_ticks: 200,
            running_hit_range: 3.0,
            running_hit_interval: 8,
            running_finish_distance: 2.0,
            running_leash: 10.0,
            running_damage_factor: 1.3,
            running_acceleration: 0.01,
            running_top_speed: 0.6,
            running_cooldown: 20,
        }
    }
}

/// Health thresholds and per-phase stat deltas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTuning {
    pub enraged_threshold: f32,
    pub berserk_threshold: f32,
    pub enraged_speed_bonus: f32,
    pub enraged_damage_bonus: f32,
    pub berserk_speed_bonus: f32,
    pub berserk_damage_bonus: f32,
    pub shockwave_radius: f32,
    pub shockwave_push: f32,
    pub shockwave_lift: f32,
}

impl Default for PhaseTuning {
    fn default() -> Self {
        Self {
            enraged_threshold: 0.6,
            berserk_threshold: 0.3,
            enraged_speed_bonus: 0.15,
            enraged_damage_bonus: 0.15,
            berserk_speed_bonus: 0.3,
            berserk_damage_bonus: 0.3,
            shockwave_radius: 5.0,
            shockwave_push: 2.0,
            shockwave_lift: 1.0,
        }
    }
}

/// Stuck detection and target watchdog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogTuning {
    pub stuck_halt_ticks: u32,
    pub stuck_nudge_ticks: u32,
    pub stuck_reset_ticks: u32,
    pub nudge_strength: f32,
    pub teleport_chance: f32,
    pub teleport_min_distance: f32,
    pub teleport_max_distance: f32,
    pub no_target_ticks: u32,
}

impl Default for WatchdogTuning {
    fn default() -> Self {
        Self {
            stuck_halt_ticks: 60,
            stuck_nudge_ticks: 100,
            stuck_reset_ticks: 120,
            nudge_strength: 0.3,
            teleport_chance: 1.0 / 3.0,
            teleport_min_distance: 3.0,
            teleport_max_distance: 6.0,
            no_target_ticks: 200,
        }
    }
}

impl BossTuning {
    /// Parse tuning from RON text and validate it
    pub fn from_ron(contents: &str) -> Result<Self, ConfigError> {
        let tuning: BossTuning = ron::from_str(contents)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check ranges that would otherwise break the state machines
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.stats.max_health <= 0.0 {
            return invalid("stats.max_health must be positive");
        }
        if self.gate.invulnerable_ticks_base == 0 {
            return invalid("gate.invulnerable_ticks_base must be at least 1");
        }
        if self.gate.min_invulnerable_ticks > self.gate.invulnerable_ticks_base {
            return invalid("gate.min_invulnerable_ticks cannot exceed the base window");
        }
        if self.gate.hit_cap == 0 {
            return invalid("gate.hit_cap must be at least 1");
        }
        if self.beam.grace_ticks >= self.beam.fire_ticks {
            return invalid("beam.grace_ticks must be shorter than beam.fire_ticks");
        }
        if self.beam.damage_interval == 0
            || self.beam.warning_checkpoint == 0
            || self.beam.charge_cue_interval == 0
            || self.beam.impact_warning_interval == 0
        {
            return invalid("beam intervals must be at least 1");
        }
        if self.beam.min_range >= self.beam.range {
            return invalid("beam.min_range must be below beam.range");
        }
        if self.grab.damage_interval == 0 {
            return invalid("grab.damage_interval must be at least 1");
        }
        if self.grab.min_distance > self.grab.reach {
            return invalid("grab.min_distance cannot exceed grab.reach");
        }
        if self.burst.linger_interval == 0 || self.burst.charge_cue_interval == 0 {
            return invalid("burst intervals must be at least 1");
        }
        if self.burst.radius <= 0.0 || self.burst.linger_radius <= 0.0 {
            return invalid("burst radii must be positive");
        }
        if self.melee.slash_strike_delay >= self.melee.slash_animation {
            return invalid("melee.slash_strike_delay must fall inside the animation");
        }
        if self.melee.dual_slam_impact_delay >= self.melee.dual_slam_animation {
            return invalid("melee.dual_slam_impact_delay must fall inside the animation");
        }
        if self.melee.combo_stage_interval == 0
            || self.melee.running_hit_interval == 0
            || self.melee.left_hand_combo_max == 0
        {
            return invalid("melee intervals must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.phase.berserk_threshold)
            || !(0.0..=1.0).contains(&self.phase.enraged_threshold)
            || self.phase.berserk_threshold > self.phase.enraged_threshold
        {
            return invalid("phase thresholds must satisfy 0 <= berserk <= enraged <= 1");
        }
        let stuck = &self.watchdog;
        if !(stuck.stuck_halt_ticks <= stuck.stuck_nudge_ticks
            && stuck.stuck_nudge_ticks <= stuck.stuck_reset_ticks)
        {
            return invalid("watchdog stuck thresholds must be ascending");
        }

        Ok(())
    }

    /// Window length for a gate opened in the given phase
    pub fn gate_window(&self, berserk: bool) -> u32 {
        let base = self.gate.invulnerable_ticks_base;
        if berserk {
            base.saturating_sub(self.gate.berserk_reduction)
                .max(self.gate.min_invulnerable_ticks)
        } else {
            base.max(self.gate.min_invulnerable_ticks)
        }
    }
}

/// Load tuning from a RON file
pub fn load_boss_tuning(path: &Path) -> Result<BossTuning, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let tuning = BossTuning::from_ron(&contents)?;
    info!("Loaded boss tuning from {}", path.display());
    Ok(tuning)
}
