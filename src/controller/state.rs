//! Agent state
//!
//! [`AgentState`] is the single aggregate the controller mutates. Every
//! subsystem reads and writes it through a `&mut` borrow handed out by the
//! step function; nothing else holds a reference to it between steps.

use bevy::prelude::*;

use super::gate::GateState;
use super::timers::TimerBank;
use super::tuning::BossTuning;
use super::world::EntityRef;

/// Health-driven escalation level. Ordered so that `Normal < Enraged < Berserk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Phase {
    #[default]
    Normal,
    Enraged,
    Berserk,
}

/// The attack currently owning the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttackState {
    #[default]
    Idle,
    Slash,
    Burst,
    Grab,
    Beam,
    Combo,
    DualSlam,
    LeftHand,
    RunningCombo,
}

/// Beam channel sub-state. `Off` unless the attack state is `Beam`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BeamState {
    #[default]
    Off,
    Warning,
    Charging,
    Firing,
}

/// Area burst sub-state. `Off` unless the attack state is `Burst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BurstStage {
    #[default]
    Off,
    Charging,
    Lingering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GrabPhase {
    #[default]
    Inactive,
    Extending,
    Attached,
}

/// Generates ordinal conversions used by the flat persistence format
macro_rules! ordinal_enum {
    ($ty:ty, [$($variant:ident),+ $(,)?]) => {
        impl $ty {
            const VARIANTS: &'static [$ty] = &[$(<$ty>::$variant),+];

            pub fn ordinal(self) -> i64 {
                Self::VARIANTS
                    .iter()
                    .position(|v| *v == self)
                    .unwrap_or(0) as i64
            }

            pub fn from_ordinal(value: i64) -> Option<Self> {
                usize::try_from(value)
                    .ok()
                    .and_then(|index| Self::VARIANTS.get(index).copied())
            }
        }
    };
}

ordinal_enum!(Phase, [Normal, Enraged, Berserk]);
ordinal_enum!(
    AttackState,
    [Idle, Slash, Burst, Grab, Beam, Combo, DualSlam, LeftHand, RunningCombo]
);
ordinal_enum!(BeamState, [Off, Warning, Charging, Firing]);
ordinal_enum!(BurstStage, [Off, Charging, Lingering]);
ordinal_enum!(GrabPhase, [Inactive, Extending, Attached]);

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Normal => "Normal",
            Phase::Enraged => "Enraged",
            Phase::Berserk => "Berserk",
        }
    }
}

/// Captured actor while a grab is in progress
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GrabState {
    pub phase: GrabPhase,
    pub target: Option<EntityRef>,
    /// Steps spent attached
    pub duration_ticks: u32,
    /// Hold point relative to the agent
    pub attach_offset: Vec3,
}

impl GrabState {
    pub fn is_active(&self) -> bool {
        self.phase != GrabPhase::Inactive
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Controller-side mirror of the agent's kinematics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    pub position: Vec3,
    /// Velocity requested this step
    pub velocity: Vec3,
    pub yaw: f32,
    pub is_moving: bool,
    pub is_running: bool,
    /// Set by channels that pin the agent in place
    pub rooted: bool,
}

/// Multipliers accumulated from phase transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatMultipliers {
    pub speed: f32,
    pub damage: f32,
}

impl Default for StatMultipliers {
    fn default() -> Self {
        Self {
            speed: 1.0,
            damage: 1.0,
        }
    }
}

/// The aggregate root owned by [`super::BossController`]
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    pub health: f32,
    pub max_health: f32,
    /// Absorption pool drained before health
    pub shield: f32,
    pub phase: Phase,
    pub attack_state: AttackState,
    pub beam_state: BeamState,
    pub burst_stage: BurstStage,
    pub timers: TimerBank,
    pub gate: GateState,
    pub grab: GrabState,
    pub body: Body,
    pub stats: StatMultipliers,
    pub attack_target: Option<EntityRef>,
    pub beam_target: Option<EntityRef>,
    pub last_attacker: Option<EntityRef>,
    pub left_hand_combo: u32,
    /// Steps the agent has failed to move while trying to
    pub stuck_ticks: u32,
    pub no_target_ticks: u32,
    /// Block-granular position used by stuck detection
    pub last_cell: IVec3,
    pub defeated: bool,
}

impl AgentState {
    /// Fresh state for a newly spawned agent
    pub fn new(tuning: &BossTuning) -> Self {
        Self {
            health: tuning.stats.max_health,
            max_health: tuning.stats.max_health,
            shield: 0.0,
            phase: Phase::Normal,
            attack_state: AttackState::Idle,
            beam_state: BeamState::Off,
            burst_stage: BurstStage::Off,
            timers: TimerBank::default(),
            gate: GateState::default(),
            grab: GrabState::default(),
            body: Body::default(),
            stats: StatMultipliers::default(),
            attack_target: None,
            beam_target: None,
            last_attacker: None,
            left_hand_combo: 0,
            stuck_ticks: 0,
            no_target_ticks: 0,
            last_cell: IVec3::ZERO,
            defeated: false,
        }
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    pub fn is_idle(&self) -> bool {
        self.attack_state == AttackState::Idle
    }

    /// Apply damage to the shield first, then health. Returns the health lost.
    pub fn absorb_then_damage(&mut self, amount: f32) -> f32 {
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let remaining = amount - absorbed;
        let before = self.health;
        self.health = (self.health - remaining).max(0.0);
        before - self.health
    }

    /// Clamp health and shield into their legal ranges
    pub fn clamp_vitals(&mut self) {
        if !self.health.is_finite() {
            self.health = 0.0;
        }
        self.health = self.health.clamp(0.0, self.max_health);
        if !self.shield.is_finite() || self.shield < 0.0 {
            self.shield = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_ordering() {
        assert!(Phase::Normal < Phase::Enraged);
        assert!(Phase::Enraged < Phase::Berserk);
    }

    #[test]
    fn test_ordinals() {
        assert_eq!(AttackState::RunningCombo.ordinal(), 8);
        assert_eq!(AttackState::from_ordinal(4), Some(AttackState::Beam));
        assert_eq!(AttackState::from_ordinal(99), None);
        assert_eq!(BeamState::from_ordinal(-1), None);
    }

    #[test]
    fn test_shield_absorbs_first() {
        let mut state = AgentState::new(&BossTuning::default());
        state.shield = 5.0;
        let lost = state.absorb_then_damage(8.0);
        assert_eq!(state.shield, 0.0);
        assert_eq!(lost, 3.0);
        assert_eq!(state.health, 197.0);
    }

    #[test]
    fn test_clamp_vitals() {
        let mut state = AgentState::new(&BossTuning::default());
        state.health = 500.0;
        state.shield = -3.0;
        state.clamp_vitals();
        assert_eq!(state.health, 200.0);
        assert_eq!(state.shield, 0.0);

        state.health = f32::NAN;
        state.clamp_vitals();
        assert_eq!(state.health, 0.0);
    }
}
