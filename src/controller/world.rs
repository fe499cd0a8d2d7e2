//! World boundary
//!
//! The controller never owns other actors. Everything it needs from the
//! surrounding simulation goes through [`WorldQuery`] (spatial queries and
//! motion/damage requests) and [`Mitigation`] (the guard check used by the
//! beam). Queries never fail: an empty result or `None` is an ordinary answer.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Stable identifier of an actor in the surrounding simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef(pub u32);

/// Per-step snapshot of another actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    pub id: EntityRef,
    pub position: Vec3,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
}

impl TargetInfo {
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

/// Result set used by radius searches and volume probes
pub type Candidates = SmallVec<[TargetInfo; 8]>;

/// Which attack produced a damage request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    Slash,
    LeftHand,
    DualSlam,
    BerserkCombo,
    RunningCombo,
    GrabSqueeze,
    Throw,
    Beam,
    BeamChip,
    BeamSplash,
    Burst,
    BurstLinger,
}

impl AttackKind {
    pub fn name(&self) -> &'static str {
        match self {
            AttackKind::Slash => "Slash",
            AttackKind::LeftHand => "Left Hand",
            AttackKind::DualSlam => "Dual Slam",
            AttackKind::BerserkCombo => "Berserk Combo",
            AttackKind::RunningCombo => "Running Combo",
            AttackKind::GrabSqueeze => "Grab",
            AttackKind::Throw => "Throw",
            AttackKind::Beam => "Void Beam",
            AttackKind::BeamChip => "Void Beam (guarded)",
            AttackKind::BeamSplash => "Void Beam Splash",
            AttackKind::Burst => "Void Burst",
            AttackKind::BurstLinger => "Void Burst Residue",
        }
    }
}

/// Status effects the controller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebuffKind {
    Slowness,
    Weakness,
    Wither,
    Blindness,
    Nausea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debuff {
    pub kind: DebuffKind,
    pub ticks: u32,
    pub amplifier: u8,
}

impl Debuff {
    pub const fn new(kind: DebuffKind, ticks: u32, amplifier: u8) -> Self {
        Self {
            kind,
            ticks,
            amplifier,
        }
    }
}

/// Telegraph cues sent to a specific actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feedback {
    /// Beam warning checkpoint, with steps left before charging
    BeamWarning { remaining: u32 },
    /// Last-moment beam warning
    BeamUrgent { remaining: u32 },
    /// Beam charge progress in [0, 1]
    BeamCharge { intensity: f32 },
    /// Beam is firing, damage starts after `remaining` steps
    BeamImpactSoon { remaining: u32 },
    /// Area burst is charging, `progress` in [0, 1]
    BurstCharging { progress: f32 },
    Grabbed,
}

/// Result of charging durability to a mitigating item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Intact,
    Broken,
}

/// Spatial queries and side-effect requests
pub trait WorldQuery {
    /// Current position of the controlled agent
    fn agent_position(&self) -> Vec3;

    /// Ask the world to move the agent with this velocity for the coming step
    fn set_agent_velocity(&mut self, velocity: Vec3);

    /// Relocate the agent. Returns false if the destination is not usable.
    fn teleport_agent(&mut self, destination: Vec3) -> bool;

    /// Look up an actor; None if it no longer exists
    fn actor(&self, id: EntityRef) -> Option<TargetInfo>;

    /// Living hostile actors within `radius` of `center`
    fn actors_within(&self, center: Vec3, radius: f32) -> Candidates;

    /// Living hostile actors whose position lies inside the box
    fn probe_volume(&self, min: Vec3, max: Vec3) -> Candidates;

    /// Line of sight from `from` to the actor
    fn can_see(&self, from: Vec3, target: EntityRef) -> bool;

    fn set_actor_velocity(&mut self, id: EntityRef, velocity: Vec3);

    fn push_actor(&mut self, id: EntityRef, impulse: Vec3);

    fn damage_actor(&mut self, id: EntityRef, amount: f32, kind: AttackKind);

    fn apply_debuff(&mut self, id: EntityRef, debuff: Debuff);

    fn grant_hurt_immunity(&mut self, id: EntityRef, ticks: u32);

    fn send_feedback(&mut self, id: EntityRef, feedback: Feedback);
}

/// Externally supplied guard check for the beam.
///
/// `is_mitigating` must be side-effect free. `consume_durability` is called at
/// most once per successful mitigation and may destroy the guarding item.
pub trait Mitigation {
    fn is_mitigating(&self, target: EntityRef) -> bool;

    fn consume_durability(&mut self, target: EntityRef, amount: u32) -> GuardOutcome;
}

/// Everything the controller talks to during a step
pub trait BossWorld: WorldQuery + Mitigation {}

impl<T: WorldQuery + Mitigation> BossWorld for T {}

/// Horizontal unit vector from `from` towards `to`, or zero when they overlap
pub fn horizontal_direction(from: Vec3, to: Vec3) -> Vec3 {
    let delta = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
    delta.normalize_or_zero()
}

/// Yaw in radians for a horizontal direction (0 faces +Z)
pub fn yaw_towards(from: Vec3, to: Vec3) -> f32 {
    let delta = to - from;
    delta.x.atan2(delta.z)
}

/// Horizontal look vector for a yaw
pub fn look_vector(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaw_round_trips_through_look_vector() {
        let from = Vec3::ZERO;
        let to = Vec3::new(3.0, 5.0, -4.0);
        let look = look_vector(yaw_towards(from, to));
        let expected = horizontal_direction(from, to);
        assert!((look - expected).length() < 1e-5);
    }

    #[test]
    fn test_horizontal_direction_ignores_height() {
        let dir = horizontal_direction(Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(dir, Vec3::ZERO);
    }
}
