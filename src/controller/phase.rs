//! Phase Controller
//!
//! Maps the health ratio onto a one-way escalation level. Each transition
//! applies its stat delta exactly once, so a single hit that skips straight
//! from `Normal` to `Berserk` still passes through `Enraged` on the way.

use bevy::prelude::*;

use super::state::{AgentState, Phase, StatMultipliers};
use super::tuning::{BossTuning, PhaseTuning};

/// Phase implied by a health ratio, ignoring history
pub fn phase_for_ratio(ratio: f32, tuning: &PhaseTuning) -> Phase {
    if ratio <= tuning.berserk_threshold {
        Phase::Berserk
    } else if ratio <= tuning.enraged_threshold {
        Phase::Enraged
    } else {
        Phase::Normal
    }
}

/// Stat multipliers after reaching `phase` from a fresh spawn
pub fn multipliers_for(phase: Phase, tuning: &PhaseTuning) -> StatMultipliers {
    let mut stats = StatMultipliers::default();
    if phase >= Phase::Enraged {
        stats.speed += tuning.enraged_speed_bonus;
        stats.damage += tuning.enraged_damage_bonus;
    }
    if phase >= Phase::Berserk {
        stats.speed += tuning.berserk_speed_bonus;
        stats.damage += tuning.berserk_damage_bonus;
    }
    stats
}

/// Promote the agent's phase if health allows. Returns each phase entered, in order.
pub fn evaluate(state: &mut AgentState, tuning: &BossTuning) -> Vec<(Phase, Phase)> {
    let mut transitions = Vec::new();
    if state.defeated {
        return transitions;
    }

    let target = phase_for_ratio(state.health_ratio(), &tuning.phase);
    while state.phase < target {
        let from = state.phase;
        let to = match from {
            Phase::Normal => Phase::Enraged,
            Phase::Enraged | Phase::Berserk => Phase::Berserk,
        };
        match to {
            Phase::Enraged => {
                state.stats.speed += tuning.phase.enraged_speed_bonus;
                state.stats.damage += tuning.phase.enraged_damage_bonus;
            }
            Phase::Berserk => {
                state.stats.speed += tuning.phase.berserk_speed_bonus;
                state.stats.damage += tuning.phase.berserk_damage_bonus;
            }
            Phase::Normal => {}
        }
        state.phase = to;
        info!(
            "Boss phase {} -> {} at {:.0}% health",
            from.name(),
            to.name(),
            state.health_ratio() * 100.0
        );
        transitions.push((from, to));
    }

    transitions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(ratio: f32) -> (AgentState, BossTuning) {
        let tuning = BossTuning::default();
        let mut state = AgentState::new(&tuning);
        state.health = state.max_health * ratio;
        (state, tuning)
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let tuning = PhaseTuning::default();
        assert_eq!(phase_for_ratio(0.61, &tuning), Phase::Normal);
        assert_eq!(phase_for_ratio(0.6, &tuning), Phase::Enraged);
        assert_eq!(phase_for_ratio(0.3, &tuning), Phase::Berserk);
    }

    #[test]
    fn test_skipped_phase_still_applies_both_deltas() {
        let (mut state, tuning) = state_at(0.1);
        let transitions = evaluate(&mut state, &tuning);
        assert_eq!(
            transitions,
            vec![(Phase::Normal, Phase::Enraged), (Phase::Enraged, Phase::Berserk)]
        );
        assert_eq!(state.stats, multipliers_for(Phase::Berserk, &tuning.phase));
        assert!((state.stats.damage - 1.45).abs() < 1e-6);
    }

    #[test]
    fn test_healing_never_demotes() {
        let (mut state, tuning) = state_at(0.2);
        evaluate(&mut state, &tuning);
        state.health = state.max_health;
        let transitions = evaluate(&mut state, &tuning);
        assert!(transitions.is_empty());
        assert_eq!(state.phase, Phase::Berserk);
    }

    #[test]
    fn test_deltas_applied_once() {
        let (mut state, tuning) = state_at(0.5);
        evaluate(&mut state, &tuning);
        evaluate(&mut state, &tuning);
        assert!((state.stats.speed - 1.15).abs() < 1e-6);
    }
}
