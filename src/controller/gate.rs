//! Damage Gate
//!
//! Converts bursts of incoming damage into a predictable, fixed amount.
//!
//! ## Rules
//!
//! 1. Trusted sources (the gate's own chunk, or explicitly exempt systems)
//!    bypass the gate and apply their raw amount.
//! 2. While the window is open every other hit is rejected outright. The
//!    window is never extended by a rejected hit.
//! 3. A hit on a closed gate opens a window, applies the fixed `taken_damage`
//!    instead of the raw amount, and schedules a chunk if the raw amount met
//!    the threshold. Health and shield are then pinned to the post-hit values
//!    for the whole window.
//! 4. When the window runs out, a pending chunk is applied exactly once.
//!
//! Consecutive qualifying hits are counted; reaching the cap forces health to
//! zero regardless of the fixed damage floor. A lethal hit abandons the window.

use bevy::prelude::*;

use super::state::{AgentState, Phase};
use super::tuning::BossTuning;
use super::world::EntityRef;
use crate::combat::events::ControllerEvent;

/// Invulnerability window bookkeeping, embedded in the agent state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GateState {
    pub invulnerable_ticks: u32,
    pub frozen_health: Option<f32>,
    pub frozen_shield: Option<f32>,
    pub pending_chunk: bool,
    /// Consecutive gate-opening hits at or above the chunk threshold
    pub qualifying_hits: u32,
}

impl GateState {
    pub fn is_open(&self) -> bool {
        self.invulnerable_ticks > 0
    }

    /// Close the window without applying anything
    fn abandon(&mut self) {
        self.invulnerable_ticks = 0;
        self.pending_chunk = false;
        self.frozen_health = None;
        self.frozen_shield = None;
    }
}

/// Where a hit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    /// A hostile actor
    Attacker(EntityRef),
    /// Falling, hazards and other sourceless damage
    Environment,
    /// The gate's own delayed chunk
    GateChunk,
    /// Systems explicitly allowed past the gate (scripted kills, admin tools)
    Exempt,
}

impl DamageSource {
    pub fn is_trusted(&self) -> bool {
        matches!(self, DamageSource::GateChunk | DamageSource::Exempt)
    }

    pub fn attacker(&self) -> Option<EntityRef> {
        match self {
            DamageSource::Attacker(id) => Some(*id),
            _ => None,
        }
    }
}

/// What the gate did with a hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Trusted hit applied at its raw amount (health actually lost)
    Applied { amount: f32 },
    /// Dropped because a window is open
    Rejected,
    /// Opened a window and applied the fixed amount
    Gated { taken: f32, chunk_pending: bool },
    /// The hit defeated the agent
    Lethal,
    /// Agent already defeated, or the amount was not a positive number
    Ignored,
}

/// Resolve one incoming hit against the gate
pub fn receive_damage(
    state: &mut AgentState,
    tuning: &BossTuning,
    amount: f32,
    source: DamageSource,
    events: &mut Vec<ControllerEvent>,
) -> DamageOutcome {
    if state.defeated || state.health <= 0.0 || !amount.is_finite() || amount <= 0.0 {
        return DamageOutcome::Ignored;
    }

    if source.is_trusted() {
        let lost = state.absorb_then_damage(amount);
        if state.health <= 0.0 {
            state.gate.abandon();
            return DamageOutcome::Lethal;
        }
        return DamageOutcome::Applied { amount: lost };
    }

    if state.gate.is_open() {
        let audible = take_feedback_slot(state, tuning);
        events.push(ControllerEvent::GateRejected {
            attacker: source.attacker(),
            amount,
            audible,
        });
        return DamageOutcome::Rejected;
    }

    let gate_cfg = &tuning.gate;
    let qualifies = amount >= gate_cfg.chunk_threshold;
    if qualifies {
        state.gate.qualifying_hits += 1;
    } else {
        state.gate.qualifying_hits = 0;
    }

    let window = tuning.gate_window(state.phase == Phase::Berserk);
    state.gate.invulnerable_ticks = state.gate.invulnerable_ticks.max(window);
    state.gate.pending_chunk = qualifies;

    if state.gate.qualifying_hits >= gate_cfg.hit_cap {
        info!(
            "Gate hit cap reached ({} qualifying hits), forcing defeat",
            state.gate.qualifying_hits
        );
        state.shield = 0.0;
        state.health = 0.0;
        state.gate.abandon();
        events.push(ControllerEvent::HitCapReached {
            hits: state.gate.qualifying_hits,
        });
        return DamageOutcome::Lethal;
    }

    let taken = state.absorb_then_damage(gate_cfg.taken_damage);
    if state.health <= 0.0 {
        state.gate.abandon();
        return DamageOutcome::Lethal;
    }

    // Snapshot after the fixed damage so the pin keeps it.
    state.gate.frozen_health = Some(state.health);
    state.gate.frozen_shield = Some(state.shield);

    let audible = take_feedback_slot(state, tuning);
    debug!(
        "Gate opened for {} steps (raw {:.1}, chunk pending: {})",
        state.gate.invulnerable_ticks, amount, qualifies
    );
    events.push(ControllerEvent::GateOpened {
        attacker: source.attacker(),
        raw_amount: amount,
        taken,
        chunk_pending: qualifies,
        window: state.gate.invulnerable_ticks,
        audible,
    });

    DamageOutcome::Gated {
        taken,
        chunk_pending: qualifies,
    }
}

/// Per-step window maintenance, run before any task logic
pub fn housekeeping(
    state: &mut AgentState,
    tuning: &BossTuning,
    events: &mut Vec<ControllerEvent>,
) {
    if state.gate.is_open() {
        state.gate.invulnerable_ticks -= 1;

        if state.health <= 0.0 {
            state.gate.abandon();
        } else {
            if let Some(health) = state.gate.frozen_health {
                state.health = health;
            }
            if let Some(shield) = state.gate.frozen_shield {
                state.shield = shield;
            }

            if state.gate.invulnerable_ticks == 0 {
                let chunk_due = state.gate.pending_chunk;
                state.gate.abandon();
                if chunk_due {
                    let amount = tuning.gate.chunk_damage;
                    let outcome =
                        receive_damage(state, tuning, amount, DamageSource::GateChunk, events);
                    debug!("Gate window closed, chunk outcome {:?}", outcome);
                    events.push(ControllerEvent::ChunkApplied {
                        amount,
                        remaining_health: state.health,
                    });
                }
            }
        }
    }

    state.clamp_vitals();
}

/// Heals are refused while a window is open so the pin stays authoritative
pub fn accepts_heal(state: &AgentState) -> bool {
    !state.gate.is_open()
}

fn take_feedback_slot(state: &mut AgentState, tuning: &BossTuning) -> bool {
    if state.timers.gate_feedback == 0 {
        state.timers.gate_feedback = tuning.gate.feedback_cooldown;
        true
    } else {
        false
    }
}
