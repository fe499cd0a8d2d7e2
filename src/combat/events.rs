//! Combat events
//!
//! Defines the events that occur during an encounter for logging and
//! presentation. The controller buffers [`ControllerEvent`]s during a step;
//! the headless runner forwards them, along with the world's
//! [`DamageDealtEvent`]s, through Bevy's event queues.

use bevy::prelude::*;

use crate::controller::scheduler::TaskKind;
use crate::controller::state::Phase;
use crate::controller::world::{AttackKind, Debuff, EntityRef};

/// Something the boss controller did or decided during a step
#[derive(Event, Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A hit opened the damage gate
    GateOpened {
        attacker: Option<EntityRef>,
        raw_amount: f32,
        taken: f32,
        chunk_pending: bool,
        window: u32,
        /// Whether presentation should play a cue (rate limited)
        audible: bool,
    },
    /// A hit was dropped because the gate was open
    GateRejected {
        attacker: Option<EntityRef>,
        amount: f32,
        audible: bool,
    },
    /// A gate window closed and released its delayed chunk
    ChunkApplied { amount: f32, remaining_health: f32 },
    /// Consecutive qualifying hits forced defeat
    HitCapReached { hits: u32 },
    HealRejected { amount: f32 },
    PhaseChanged { from: Phase, to: Phase },
    /// Berserk entry knocked nearby actors away
    Shockwave { pushed: usize },
    TaskStarted { task: TaskKind },
    TaskStopped { task: TaskKind },
    TargetAcquired { target: EntityRef },
    TargetLost { target: EntityRef },
    BeamTelegraphed { target: EntityRef },
    BeamFired {
        target: EntityRef,
        origin: Vec3,
        end: Vec3,
    },
    /// Beam channel over; `completed` is false for a cancellation
    BeamEnded { completed: bool },
    GuardBroken { target: EntityRef },
    GrabAttached { target: EntityRef },
    GrabReleased {
        target: EntityRef,
        thrown: bool,
        held_ticks: u32,
    },
    BurstCharging,
    BurstDetonated { hits: usize },
    /// Stuck watchdog intervened
    Unstuck { teleported: bool },
    Defeated,
    Respawned,
}

/// Fired by the world whenever the boss damages another actor
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageDealtEvent {
    /// Actor receiving the damage
    pub target: EntityRef,
    /// Attack that caused it
    pub kind: AttackKind,
    /// Amount requested by the controller
    pub amount: f32,
    /// Amount actually removed from health
    pub applied: f32,
    /// Whether the hit killed the target
    pub killing_blow: bool,
}

/// Fired when an actor lands a hit on the boss
#[derive(Event, Debug, Clone, PartialEq)]
pub struct BossHitEvent {
    pub attacker: EntityRef,
    /// Raw amount before the gate
    pub amount: f32,
    /// Health actually lost
    pub health_lost: f32,
}

/// Fired by the world when a debuff requested by the boss lands
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DebuffAppliedEvent {
    pub target: EntityRef,
    pub debuff: Debuff,
}
