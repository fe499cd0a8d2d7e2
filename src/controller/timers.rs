//! Timer Bank
//!
//! Plain countdowns shared by every subsystem. Each one is decremented exactly
//! once per step by [`TimerBank::tick`], before anything else runs, and never
//! goes below zero. A timer at zero means "ready" for cooldowns and "expired"
//! for channels.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerBank {
    /// Shared melee/grab cooldown
    pub attack_cooldown: u32,
    /// Area burst cooldown
    pub special_cooldown: u32,
    pub left_hand_cooldown: u32,
    pub dual_slam_cooldown: u32,
    pub beam_cooldown: u32,
    /// Remaining frames of the current melee or grab animation
    pub animation: u32,
    /// Remaining steps in the current beam sub-state
    pub beam: u32,
    pub grab_extend: u32,
    pub burst_charge: u32,
    pub burst_linger: u32,
    /// Steps until the left hand combo counter decays by one
    pub combo_decay: u32,
    /// Rate limit for gate open/reject cues
    pub gate_feedback: u32,
}

/// Names used when the bank is flattened for persistence
pub const TIMER_NAMES: [&str; 12] = [
    "attack_cooldown",
    "special_cooldown",
    "left_hand_cooldown",
    "dual_slam_cooldown",
    "beam_cooldown",
    "animation",
    "beam",
    "grab_extend",
    "burst_charge",
    "burst_linger",
    "combo_decay",
    "gate_feedback",
];

impl TimerBank {
    /// Advance every countdown by one step
    pub fn tick(&mut self) {
        for timer in self.slots_mut() {
            *timer = timer.saturating_sub(1);
        }
    }

    /// Reset every countdown to zero
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Look up a timer by its persisted name
    pub fn get(&self, name: &str) -> Option<u32> {
        TIMER_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|index| self.slots()[index])
    }

    /// Set a timer by its persisted name. Returns false for unknown names.
    pub fn set(&mut self, name: &str, value: u32) -> bool {
        match TIMER_NAMES.iter().position(|n| *n == name) {
            Some(index) => {
                let mut slots = self.slots_mut();
                *slots[index] = value;
                true
            }
            None => false,
        }
    }

    fn slots(&self) -> [u32; 12] {
        [
            self.attack_cooldown,
            self.special_cooldown,
            self.left_hand_cooldown,
            self.dual_slam_cooldown,
            self.beam_cooldown,
            self.animation,
            self.beam,
            self.grab_extend,
            self.burst_charge,
            self.burst_linger,
            self.combo_decay,
            self.gate_feedback,
        ]
    }

    fn slots_mut(&mut self) -> [&mut u32; 12] {
        [
            &mut self.attack_cooldown,
            &mut self.special_cooldown,
            &mut self.left_hand_cooldown,
            &mut self.dual_slam_cooldown,
            &mut self.beam_cooldown,
            &mut self.animation,
            &mut self.beam,
            &mut self.grab_extend,
            &mut self.burst_charge,
            &mut self.burst_linger,
            &mut self.combo_decay,
            &mut self.gate_feedback,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_saturates_at_zero() {
        let mut bank = TimerBank {
            attack_cooldown: 1,
            beam: 3,
            ..Default::default()
        };
        bank.tick();
        bank.tick();
        assert_eq!(bank.attack_cooldown, 0);
        assert_eq!(bank.beam, 1);
        assert_eq!(bank.special_cooldown, 0);
    }

    #[test]
    fn test_named_access_covers_every_slot() {
        let mut bank = TimerBank::default();
        for (i, name) in TIMER_NAMES.iter().enumerate() {
            assert!(bank.set(name, i as u32 + 1));
        }
        for (i, name) in TIMER_NAMES.iter().enumerate() {
            assert_eq!(bank.get(name), Some(i as u32 + 1));
        }
        assert!(!bank.set("no_such_timer", 5));
        assert_eq!(bank.get("no_such_timer"), None);
    }
}
