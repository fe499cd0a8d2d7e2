//! Combat logging system
//!
//! Reads the controller's and the world's events each update and records
//! them in the [`CombatLog`].

use bevy::prelude::*;

use super::events::{BossHitEvent, ControllerEvent, DamageDealtEvent, DebuffAppliedEvent};
use super::log::{CombatLog, CombatLogEventType};
use super::{CombatantNames, BOSS_NAME};
use crate::controller::scheduler::TaskKind;

/// Record combat events to the combat log
pub fn record_combat_log(
    mut combat_log: ResMut<CombatLog>,
    names: Res<CombatantNames>,
    mut controller_events: EventReader<ControllerEvent>,
    mut damage_events: EventReader<DamageDealtEvent>,
    mut hit_events: EventReader<BossHitEvent>,
    mut debuff_events: EventReader<DebuffAppliedEvent>,
) {
    // Hits on the boss come first: they resolve at the start of its step
    for event in hit_events.read() {
        let attacker = names.name_of(event.attacker);
        let message = format!(
            "{} hits {} for {:.0} ({:.0} raw)",
            attacker, BOSS_NAME, event.health_lost, event.amount
        );
        combat_log.log_damage(
            attacker,
            BOSS_NAME.to_string(),
            "Attack".to_string(),
            event.health_lost,
            false,
            message,
        );
    }

    for event in controller_events.read() {
        record_controller_event(&mut combat_log, &names, event);
    }

    for event in damage_events.read() {
        let target = names.name_of(event.target);
        let message = format!(
            "{}'s {} hits {} for {:.0}",
            BOSS_NAME,
            event.kind.name(),
            target,
            event.applied
        );
        combat_log.log_damage(
            BOSS_NAME.to_string(),
            target.clone(),
            event.kind.name().to_string(),
            event.applied,
            event.killing_blow,
            message,
        );
        if event.killing_blow {
            let message = format!("{} has been slain by {}", target, BOSS_NAME);
            combat_log.log_death(target, Some(BOSS_NAME.to_string()), message);
        }
    }

    for event in debuff_events.read() {
        let target = names.name_of(event.target);
        let debuff = format!("{:?}", event.debuff.kind);
        let message = format!(
            "{} is afflicted with {} {} for {} ticks",
            target,
            debuff,
            event.debuff.amplifier + 1,
            event.debuff.ticks
        );
        combat_log.log_debuff(target, debuff, event.debuff.ticks, message);
    }
}

fn record_controller_event(log: &mut CombatLog, names: &CombatantNames, event: &ControllerEvent) {
    match event {
        ControllerEvent::GateOpened {
            attacker,
            raw_amount,
            taken,
            chunk_pending,
            window,
            ..
        } => {
            let chunk = if *chunk_pending { ", chunk pending" } else { "" };
            let message = format!(
                "{}'s gate absorbs {:.0} from {} (took {:.0}{}), invulnerable for {} ticks",
                BOSS_NAME,
                raw_amount,
                names.name_or_unknown(*attacker),
                taken,
                chunk,
                window
            );
            log.log_gate(*taken, *chunk_pending, *window, message);
        }
        ControllerEvent::GateRejected {
            attacker, amount, ..
        } => log.log(
            CombatLogEventType::GateWindow,
            format!(
                "{}'s hit for {:.0} is rejected by the gate",
                names.name_or_unknown(*attacker),
                amount
            ),
        ),
        ControllerEvent::ChunkApplied {
            amount,
            remaining_health,
        } => log.log(
            CombatLogEventType::GateWindow,
            format!(
                "Gate closes: {} takes a {:.0} chunk ({:.0} health left)",
                BOSS_NAME, amount, remaining_health
            ),
        ),
        ControllerEvent::HitCapReached { hits } => log.log(
            CombatLogEventType::GateWindow,
            format!("{} heavy hits in a row overwhelm {}", hits, BOSS_NAME),
        ),
        ControllerEvent::HealRejected { amount } => log.log_healing(
            BOSS_NAME.to_string(),
            *amount,
            false,
            format!("Heal of {:.0} on {} refused by the gate", amount, BOSS_NAME),
        ),
        ControllerEvent::PhaseChanged { from, to } => log.log(
            CombatLogEventType::PhaseChange,
            format!("{} shifts from {} to {}", BOSS_NAME, from.name(), to.name()),
        ),
        ControllerEvent::Shockwave { pushed } => log.log_ability(
            BOSS_NAME.to_string(),
            "Berserk Shockwave".to_string(),
            format!("{} unleashes a shockwave, hurling {} away", BOSS_NAME, pushed),
        ),
        ControllerEvent::TaskStarted { task } => {
            if !matches!(task, TaskKind::Chase | TaskKind::Wander) {
                log.log_ability(
                    BOSS_NAME.to_string(),
                    task.name().to_string(),
                    format!("{} begins {}", BOSS_NAME, task.name()),
                );
            }
        }
        ControllerEvent::TaskStopped { .. } => {}
        ControllerEvent::TargetAcquired { target } => log.log(
            CombatLogEventType::MatchEvent,
            format!("{} turns on {}", BOSS_NAME, names.name_of(*target)),
        ),
        ControllerEvent::TargetLost { target } => log.log(
            CombatLogEventType::MatchEvent,
            format!("{} loses track of {}", BOSS_NAME, names.name_of(*target)),
        ),
        ControllerEvent::BeamTelegraphed { target } => log.log(
            CombatLogEventType::AbilityUsed,
            format!("{} fixes its gaze on {}", BOSS_NAME, names.name_of(*target)),
        ),
        ControllerEvent::BeamFired { target, .. } => log.log(
            CombatLogEventType::AbilityUsed,
            format!("Void Beam fires at {}", names.name_of(*target)),
        ),
        ControllerEvent::BeamEnded { completed } => {
            let outcome = if *completed { "fades" } else { "is cancelled" };
            log.log(
                CombatLogEventType::AbilityUsed,
                format!("Void Beam {}", outcome),
            );
        }
        ControllerEvent::GuardBroken { target } => log.log(
            CombatLogEventType::MatchEvent,
            format!("{}'s guard shatters", names.name_of(*target)),
        ),
        ControllerEvent::GrabAttached { target } => log.log(
            CombatLogEventType::AbilityUsed,
            format!("{} seizes {}", BOSS_NAME, names.name_of(*target)),
        ),
        ControllerEvent::GrabReleased {
            target,
            thrown,
            held_ticks,
        } => {
            let verb = if *thrown { "throws" } else { "releases" };
            log.log(
                CombatLogEventType::AbilityUsed,
                format!(
                    "{} {} {} after {} ticks",
                    BOSS_NAME,
                    verb,
                    names.name_of(*target),
                    held_ticks
                ),
            );
        }
        ControllerEvent::BurstCharging => {}
        ControllerEvent::BurstDetonated { hits } => log.log(
            CombatLogEventType::AbilityUsed,
            format!("Void Burst detonates, catching {}", hits),
        ),
        ControllerEvent::Unstuck { teleported } => {
            let how = if *teleported { "teleports" } else { "shakes itself" };
            log.log(
                CombatLogEventType::MatchEvent,
                format!("{} {} free", BOSS_NAME, how),
            );
        }
        ControllerEvent::Defeated => log.log_death(
            BOSS_NAME.to_string(),
            None,
            format!("{} has been defeated", BOSS_NAME),
        ),
        ControllerEvent::Respawned => log.log(
            CombatLogEventType::MatchEvent,
            format!("{} rises again", BOSS_NAME),
        ),
    }
}
