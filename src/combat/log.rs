//! Combat logging
//!
//! Records everything that happens in an encounter for post-match analysis.
//! Entries are stamped with the simulation tick and carry optional
//! structured data so aggregates can be computed without parsing messages.

use bevy::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::controller::tuning::ConfigError;

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize)]
pub struct CombatLogEntry {
    /// Simulation tick the event happened on
    pub tick: u64,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
    /// Machine-readable payload, when the event has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredEventData>,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done or refused
    Healing,
    /// Boss attack or challenger ability used
    AbilityUsed,
    /// Debuff applied
    DebuffApplied,
    /// Damage gate opened, rejected a hit, or released a chunk
    GateWindow,
    /// Boss phase transition
    PhaseChange,
    /// Combatant died
    Death,
    /// Match event (start, end, etc.)
    MatchEvent,
}

/// Structured payloads for the event types that have them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum StructuredEventData {
    Damage {
        source: String,
        target: String,
        ability: String,
        amount: f32,
        killing_blow: bool,
    },
    Healing {
        target: String,
        amount: f32,
        accepted: bool,
    },
    Ability {
        source: String,
        ability: String,
    },
    Debuff {
        target: String,
        debuff: String,
        ticks: u32,
    },
    Gate {
        taken: f32,
        chunk_pending: bool,
        window: u32,
    },
    Death {
        combatant: String,
        killer: Option<String>,
    },
}

/// The combat log resource storing all events
#[derive(Resource, Default, Debug)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current simulation tick
    pub tick: u64,
    /// Registered participants, in registration order
    combatants: Vec<String>,
}

#[derive(Serialize)]
struct CombatLogExport<'a> {
    ticks: u64,
    combatants: &'a [String],
    entries: &'a [CombatLogEntry],
}

impl CombatLog {
    /// Clear the log for a new match
    pub fn clear(&mut self) {
        self.entries.clear();
        self.combatants.clear();
        self.tick = 0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.push(event_type, message, None);
    }

    fn push(
        &mut self,
        event_type: CombatLogEventType,
        message: String,
        data: Option<StructuredEventData>,
    ) {
        self.entries.push(CombatLogEntry {
            tick: self.tick,
            event_type,
            message,
            data,
        });
    }

    pub fn register_combatant(&mut self, name: String) {
        if !self.combatants.contains(&name) {
            self.combatants.push(name);
        }
    }

    pub fn all_combatants(&self) -> &[String] {
        &self.combatants
    }

    pub fn log_damage(
        &mut self,
        source: String,
        target: String,
        ability: String,
        amount: f32,
        killing_blow: bool,
        message: String,
    ) {
        self.push(
            CombatLogEventType::Damage,
            message,
            Some(StructuredEventData::Damage {
                source,
                target,
                ability,
                amount,
                killing_blow,
            }),
        );
    }

    pub fn log_healing(&mut self, target: String, amount: f32, accepted: bool, message: String) {
        self.push(
            CombatLogEventType::Healing,
            message,
            Some(StructuredEventData::Healing {
                target,
                amount,
                accepted,
            }),
        );
    }

    pub fn log_ability(&mut self, source: String, ability: String, message: String) {
        self.push(
            CombatLogEventType::AbilityUsed,
            message,
            Some(StructuredEventData::Ability { source, ability }),
        );
    }

    pub fn log_debuff(&mut self, target: String, debuff: String, ticks: u32, message: String) {
        self.push(
            CombatLogEventType::DebuffApplied,
            message,
            Some(StructuredEventData::Debuff {
                target,
                debuff,
                ticks,
            }),
        );
    }

    pub fn log_gate(&mut self, taken: f32, chunk_pending: bool, window: u32, message: String) {
        self.push(
            CombatLogEventType::GateWindow,
            message,
            Some(StructuredEventData::Gate {
                taken,
                chunk_pending,
                window,
            }),
        );
    }

    pub fn log_death(&mut self, combatant: String, killer: Option<String>, message: String) {
        self.push(
            CombatLogEventType::Death,
            message,
            Some(StructuredEventData::Death { combatant, killer }),
        );
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage and healing)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    fn damage_entries(&self) -> impl Iterator<Item = (&str, &str, &str, f32, bool)> {
        self.entries.iter().filter_map(|e| match &e.data {
            Some(StructuredEventData::Damage {
                source,
                target,
                ability,
                amount,
                killing_blow,
            }) => Some((
                source.as_str(),
                target.as_str(),
                ability.as_str(),
                *amount,
                *killing_blow,
            )),
            _ => None,
        })
    }

    /// Total damage per ability for one source
    pub fn damage_by_ability(&self, source: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for (from, _, ability, amount, _) in self.damage_entries() {
            if from == source {
                *totals.entry(ability.to_string()).or_insert(0.0) += amount;
            }
        }
        totals
    }

    pub fn total_damage_dealt(&self, source: &str) -> f32 {
        self.damage_entries()
            .filter(|(from, ..)| *from == source)
            .map(|(_, _, _, amount, _)| amount)
            .sum()
    }

    pub fn total_damage_taken(&self, target: &str) -> f32 {
        self.damage_entries()
            .filter(|(_, to, ..)| *to == target)
            .map(|(_, _, _, amount, _)| amount)
            .sum()
    }

    pub fn killing_blows(&self, source: &str) -> usize {
        self.damage_entries()
            .filter(|(from, _, _, _, killing_blow)| *from == source && *killing_blow)
            .count()
    }

    /// Number of uses per ability for one source
    pub fn ability_uses(&self, source: &str) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for entry in &self.entries {
            if let Some(StructuredEventData::Ability { source: from, ability }) = &entry.data {
                if from == source {
                    *counts.entry(ability.clone()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// Gate windows opened during the match
    pub fn gate_windows(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.data, Some(StructuredEventData::Gate { .. })))
            .count()
    }

    pub fn combatant_survived(&self, name: &str) -> bool {
        !self.entries.iter().any(|e| {
            matches!(
                &e.data,
                Some(StructuredEventData::Death { combatant, .. }) if combatant == name
            )
        })
    }

    /// Write the log as pretty JSON
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let export = CombatLogExport {
            ticks: self.tick,
            combatants: &self.combatants,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path, json)?;
        info!("Combat log saved to {}", path.display());
        Ok(())
    }
}
