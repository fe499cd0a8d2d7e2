//! Flat key-value persistence
//!
//! The agent state is exported as a map of named scalar fields so any storage
//! layer can hold it. Reading is forgiving: a missing, mistyped or out-of-range
//! field falls back to its default (timers 0, enums at their first variant)
//! and the snapshot is then repaired so the state invariants hold again.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::phase::multipliers_for;
use super::state::{AgentState, AttackState, BeamState, BurstStage, GrabPhase, Phase};
use super::timers::TIMER_NAMES;
use super::tuning::{BossTuning, ConfigError};
use super::world::EntityRef;

/// One persisted scalar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// Named scalar fields describing one agent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    fields: BTreeMap<String, FieldValue>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Integer field. Whole floats are accepted.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            FieldValue::Int(value) => Some(value),
            FieldValue::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                Some(value as i64)
            }
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.get(key)? {
            FieldValue::Float(value) if value.is_finite() => Some(value as f32),
            FieldValue::Int(value) => Some(value as f32),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            FieldValue::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Counter field clamped into `u32`; anything unusable reads as 0
    pub fn get_ticks(&self, key: &str) -> u32 {
        self.get_int(key)
            .map(|value| value.clamp(0, u32::MAX as i64) as u32)
            .unwrap_or(0)
    }

    fn get_entity(&self, key: &str) -> Option<EntityRef> {
        self.get_int(key)
            .and_then(|value| u32::try_from(value).ok())
            .map(EntityRef)
    }

    fn put_entity(&mut self, key: &str, entity: Option<EntityRef>) {
        if let Some(EntityRef(id)) = entity {
            self.insert(key, FieldValue::Int(id as i64));
        }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn timer_key(name: &str) -> String {
    format!("timer.{}", name)
}

/// Export every persisted field of the agent
pub fn capture(state: &AgentState) -> Snapshot {
    let mut snap = Snapshot::new();
    let float = |v: f32| FieldValue::Float(v as f64);
    let int = |v: u32| FieldValue::Int(v as i64);

    snap.insert("health", float(state.health));
    snap.insert("shield", float(state.shield));
    snap.insert("phase", FieldValue::Int(state.phase.ordinal()));
    snap.insert("attack_state", FieldValue::Int(state.attack_state.ordinal()));
    snap.insert("beam_state", FieldValue::Int(state.beam_state.ordinal()));
    snap.insert("burst_stage", FieldValue::Int(state.burst_stage.ordinal()));
    snap.insert("defeated", FieldValue::Bool(state.defeated));
    snap.insert("yaw", float(state.body.yaw));
    snap.insert("left_hand_combo", int(state.left_hand_combo));
    snap.insert("stuck_ticks", int(state.stuck_ticks));
    snap.insert("no_target_ticks", int(state.no_target_ticks));

    for name in TIMER_NAMES {
        snap.insert(timer_key(name), int(state.timers.get(name).unwrap_or(0)));
    }

    let gate = &state.gate;
    snap.insert("gate.invulnerable_ticks", int(gate.invulnerable_ticks));
    snap.insert("gate.pending_chunk", FieldValue::Bool(gate.pending_chunk));
    snap.insert("gate.qualifying_hits", int(gate.qualifying_hits));
    if let Some(health) = gate.frozen_health {
        snap.insert("gate.frozen_health", float(health));
    }
    if let Some(shield) = gate.frozen_shield {
        snap.insert("gate.frozen_shield", float(shield));
    }

    let grab = &state.grab;
    snap.insert("grab.phase", FieldValue::Int(grab.phase.ordinal()));
    snap.insert("grab.duration", int(grab.duration_ticks));
    snap.insert("grab.offset_x", float(grab.attach_offset.x));
    snap.insert("grab.offset_y", float(grab.attach_offset.y));
    snap.insert("grab.offset_z", float(grab.attach_offset.z));
    snap.put_entity("grab.target", grab.target);

    snap.put_entity("attack_target", state.attack_target);
    snap.put_entity("beam_target", state.beam_target);
    snap.put_entity("last_attacker", state.last_attacker);

    snap
}

/// Rebuild agent state from a snapshot, defaulting anything unusable
pub fn restore(snap: &Snapshot, tuning: &BossTuning) -> AgentState {
    let mut state = AgentState::new(tuning);

    // A fresh agent starts at full health, so that is the default here too.
    state.health = snap.get_float("health").unwrap_or(state.max_health);
    state.shield = snap.get_float("shield").unwrap_or(0.0);
    state.phase = snap
        .get_int("phase")
        .and_then(Phase::from_ordinal)
        .unwrap_or_default();
    state.attack_state = snap
        .get_int("attack_state")
        .and_then(AttackState::from_ordinal)
        .unwrap_or_default();
    state.beam_state = snap
        .get_int("beam_state")
        .and_then(BeamState::from_ordinal)
        .unwrap_or_default();
    state.burst_stage = snap
        .get_int("burst_stage")
        .and_then(BurstStage::from_ordinal)
        .unwrap_or_default();
    state.defeated = snap.get_bool("defeated").unwrap_or(false);
    state.body.yaw = snap.get_float("yaw").unwrap_or(0.0);
    state.left_hand_combo = snap.get_ticks("left_hand_combo");
    state.stuck_ticks = snap.get_ticks("stuck_ticks");
    state.no_target_ticks = snap.get_ticks("no_target_ticks");

    for name in TIMER_NAMES {
        state.timers.set(name, snap.get_ticks(&timer_key(name)));
    }

    state.gate.invulnerable_ticks = snap.get_ticks("gate.invulnerable_ticks");
    state.gate.pending_chunk = snap.get_bool("gate.pending_chunk").unwrap_or(false);
    state.gate.qualifying_hits = snap.get_ticks("gate.qualifying_hits");
    state.gate.frozen_health = snap.get_float("gate.frozen_health");
    state.gate.frozen_shield = snap.get_float("gate.frozen_shield");

    state.grab.phase = snap
        .get_int("grab.phase")
        .and_then(GrabPhase::from_ordinal)
        .unwrap_or_default();
    state.grab.duration_ticks = snap.get_ticks("grab.duration");
    state.grab.attach_offset = Vec3::new(
        snap.get_float("grab.offset_x").unwrap_or(0.0),
        snap.get_float("grab.offset_y").unwrap_or(0.0),
        snap.get_float("grab.offset_z").unwrap_or(0.0),
    );
    state.grab.target = snap.get_entity("grab.target");

    state.attack_target = snap.get_entity("attack_target");
    state.beam_target = snap.get_entity("beam_target");
    state.last_attacker = snap.get_entity("last_attacker");

    repair(&mut state, tuning);
    state
}

/// Re-establish invariants a partial or hand-edited snapshot may violate
fn repair(state: &mut AgentState, tuning: &BossTuning) {
    state.clamp_vitals();
    state.stats = multipliers_for(state.phase, &tuning.phase);

    if state.health <= 0.0 {
        state.defeated = true;
    }
    if state.defeated {
        state.attack_state = AttackState::Idle;
    }

    if !state.gate.is_open() {
        state.gate.pending_chunk = false;
        state.gate.frozen_health = None;
        state.gate.frozen_shield = None;
    }

    let beam_ok = state.attack_state == AttackState::Beam
        && state.beam_state != BeamState::Off
        && state.beam_target.is_some();
    let burst_ok = state.attack_state == AttackState::Burst && state.burst_stage != BurstStage::Off;
    let grab_ok = state.attack_state == AttackState::Grab
        && match state.grab.phase {
            GrabPhase::Inactive => false,
            GrabPhase::Extending => true,
            GrabPhase::Attached => state.grab.target.is_some(),
        };

    match state.attack_state {
        AttackState::Beam if !beam_ok => state.attack_state = AttackState::Idle,
        AttackState::Burst if !burst_ok => state.attack_state = AttackState::Idle,
        AttackState::Grab if !grab_ok => state.attack_state = AttackState::Idle,
        _ => {}
    }
    if state.attack_state != AttackState::Beam {
        state.beam_state = BeamState::Off;
        state.beam_target = None;
    }
    if state.attack_state != AttackState::Burst {
        state.burst_stage = BurstStage::Off;
    }
    if state.attack_state != AttackState::Grab {
        state.grab.clear();
    }

    // Channel timers never exceed the stage they count down
    let beam_stage = match state.beam_state {
        BeamState::Off => 0,
        BeamState::Warning => tuning.beam.warning_ticks,
        BeamState::Charging => tuning.beam.charge_ticks,
        BeamState::Firing => tuning.beam.fire_ticks,
    };
    state.timers.beam = state.timers.beam.min(beam_stage);
    state.timers.burst_charge = state.timers.burst_charge.min(tuning.burst.charge_ticks);
    state.timers.burst_linger = state.timers.burst_linger.min(tuning.burst.linger_ticks);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_is_fresh_agent() {
        let tuning = BossTuning::default();
        let state = restore(&Snapshot::new(), &tuning);
        assert_eq!(state, AgentState::new(&tuning));
    }

    #[test]
    fn test_negative_timer_reads_as_zero() {
        let mut snap = Snapshot::new();
        snap.insert("timer.beam_cooldown", FieldValue::Int(-40));
        snap.insert("timer.attack_cooldown", FieldValue::Bool(true));
        let state = restore(&snap, &BossTuning::default());
        assert_eq!(state.timers.beam_cooldown, 0);
        assert_eq!(state.timers.attack_cooldown, 0);
    }

    #[test]
    fn test_bad_ordinal_falls_back() {
        let mut snap = Snapshot::new();
        snap.insert("phase", FieldValue::Int(17));
        snap.insert("attack_state", FieldValue::Float(2.5));
        let state = restore(&snap, &BossTuning::default());
        assert_eq!(state.phase, Phase::Normal);
        assert_eq!(state.attack_state, AttackState::Idle);
    }

    #[test]
    fn test_beam_without_target_is_repaired() {
        let mut snap = Snapshot::new();
        snap.insert("attack_state", FieldValue::Int(AttackState::Beam.ordinal()));
        snap.insert("beam_state", FieldValue::Int(BeamState::Firing.ordinal()));
        let state = restore(&snap, &BossTuning::default());
        assert_eq!(state.attack_state, AttackState::Idle);
        assert_eq!(state.beam_state, BeamState::Off);
    }

    #[test]
    fn test_pending_chunk_requires_open_window() {
        let mut snap = Snapshot::new();
        snap.insert("gate.pending_chunk", FieldValue::Bool(true));
        let state = restore(&snap, &BossTuning::default());
        assert!(!state.gate.pending_chunk);
    }

    #[test]
    fn test_restored_phase_rebuilds_multipliers() {
        let tuning = BossTuning::default();
        let mut snap = Snapshot::new();
        snap.insert("phase", FieldValue::Int(Phase::Berserk.ordinal()));
        snap.insert("health", FieldValue::Float(40.0));
        let state = restore(&snap, &tuning);
        assert_eq!(state.stats, multipliers_for(Phase::Berserk, &tuning.phase));
    }

    #[test]
    fn test_json_keeps_value_kinds() {
        let mut snap = Snapshot::new();
        snap.insert("a", FieldValue::Int(3));
        snap.insert("b", FieldValue::Float(2.5));
        snap.insert("c", FieldValue::Bool(false));
        let parsed = Snapshot::from_json(&snap.to_json().unwrap()).unwrap();
        assert_eq!(parsed.get_int("a"), Some(3));
        assert_eq!(parsed.get_float("b"), Some(2.5));
        assert_eq!(parsed.get_bool("c"), Some(false));
    }
}
