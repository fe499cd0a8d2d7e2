//! Melee attacks and combo chains
//!
//! All of these are driven by the shared animation timer: a strike lands when
//! the remaining animation hits a specific frame, and the task ends when the
//! animation runs out. Deriving the stage from the timer keeps a restored
//! snapshot consistent without persisting per-task counters.

use bevy::prelude::*;
use std::f32::consts::{FRAC_PI_4, PI, TAU};

use crate::controller::scheduler::{BossTask, TaskCtx, TaskKind};
use crate::controller::state::{AttackState, Phase};
use crate::controller::world::{look_vector, yaw_towards, AttackKind, Debuff, DebuffKind, TargetInfo};

/// Signed angle from `from` to `to`, wrapped into [-PI, PI)
fn angle_between(from: f32, to: f32) -> f32 {
    (to - from + PI).rem_euclid(TAU) - PI
}

/// Common guard for starting any attack
fn ready_to_attack(ctx: &TaskCtx) -> bool {
    ctx.state.is_idle() && !ctx.state.grab.is_active()
}

/// Basic slash
pub struct SlashTask;

impl BossTask for SlashTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Slash
    }

    fn claims(&self) -> Option<AttackState> {
        Some(AttackState::Slash)
    }

    fn should_start(&mut self, ctx: &mut TaskCtx) -> bool {
        if !ready_to_attack(ctx) || ctx.state.timers.attack_cooldown > 0 {
            return false;
        }
        ctx.target()
            .is_some_and(|t| ctx.distance_to(&t) < ctx.tuning.melee.slash_range)
    }

    fn start(&mut self, ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        ctx.state.attack_state = AttackState::Slash;
        ctx.state.timers.animation = tuning.melee.slash_animation;
        ctx.state.timers.attack_cooldown = tuning.melee.slash_cooldown;
        ctx.halt();
    }

    fn tick(&mut self, ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.melee;
        let Some(target) = ctx.target() else {
            return;
        };
        ctx.face(target.position);
        let strike_frame = cfg.slash_animation - cfg.slash_strike_delay;
        if ctx.state.timers.animation == strike_frame && ctx.distance_to(&target) < cfg.slash_range {
            ctx.strike(target.id, tuning.stats.attack_damage, AttackKind::Slash);
        }
    }

    fn should_continue(&mut self, ctx: &mut TaskCtx) -> bool {
        ctx.state.attack_state == AttackState::Slash
            && ctx.state.timers.animation > 0
            && ctx.target().is_some()
    }

    fn stop(&mut self, ctx: &mut TaskCtx) {
        ctx.state.timers.animation = 0;
        ctx.state.attack_state = AttackState::Idle;
    }
}

/// Quick off-hand swipes that build a combo counter
pub struct LeftHandTask;

impl LeftHandTask {
    fn hit(ctx: &mut TaskCtx, target: &TargetInfo) {
        let tuning = ctx.tuning;
        let cfg = &tuning.melee;
        let combo = ctx.state.left_hand_combo as f32;

        ctx.strike(
            target.id,
            tuning.stats.attack_damage * (1.1 + 0.1 * combo),
            AttackKind::LeftHand,
        );

        // Swipes knock sideways rather than straight back.
        let sideways = yaw_towards(ctx.agent_position(), target.position) + FRAC_PI_4;
        let impulse = look_vector(sideways) * (1.2 + 0.2 * combo) + Vec3::Y * 0.4;
        ctx.world.push_actor(target.id, impulse);
        ctx.world
            .apply_debuff(target.id, Debuff::new(DebuffKind::Weakness, 80, 1));
        ctx.world
            .apply_debuff(target.id, Debuff::new(DebuffKind::Wither, 60, 0));

        ctx.state.left_hand_combo = (ctx.state.left_hand_combo + 1) % cfg.left_hand_combo_max;
        ctx.state.timers.combo_decay = cfg.left_hand_combo_decay;
    }
}

impl BossTask for LeftHandTask {
    fn kind(&self) -> TaskKind {
        TaskKind::LeftHand
    }

    fn claims(&self) -> Option<AttackState> {
        Some(AttackState::LeftHand)
    }

    fn should_start(&mut self, ctx: &mut TaskCtx) -> bool {
        if !ready_to_attack(ctx) || ctx.state.timers.left_hand_cooldown > 0 {
            return false;
        }
        let tuning = ctx.tuning;
        let in_reach = ctx
            .target()
            .is_some_and(|t| ctx.distance_to(&t) < tuning.melee.left_hand_range);
        in_reach && ctx.rng.chance(tuning.melee.left_hand_chance)
    }

    fn start(&mut self, ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        ctx.state.attack_state = AttackState::LeftHand;
        ctx.state.timers.animation = tuning.melee.left_hand_animation;
        ctx.state.timers.left_hand_cooldown = tuning.melee.left_hand_cooldown;
        ctx.halt();
    }

    fn tick(&mut self, ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.melee;
        let Some(target) = ctx.target() else {
            return;
        };
        ctx.face(target.position);
        let frame = ctx.state.timers.animation;
        if cfg.left_hand_hit_frames.contains(&frame) && ctx.distance_to(&target) < cfg.left_hand_range {
            Self::hit(ctx, &target);
        }
    }

    fn should_continue(&mut self, ctx: &mut TaskCtx) -> bool {
        ctx.state.attack_state == AttackState::LeftHand
            && ctx.state.timers.animation > 0
            && ctx.target().is_some()
    }

    fn stop(&mut self, ctx: &mut TaskCtx) {
        ctx.state.timers.animation = 0;
        ctx.state.attack_state = AttackState::Idle;
    }
}

/// Two-handed ground slam with a delayed impact
pub struct DualSlamTask;

impl DualSlamTask {
    fn impact(ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.melee;
        let center = ctx.agent_position();
        let half = Vec3::new(cfg.dual_slam_range, 2.0, cfg.dual_slam_range);
        let caught = ctx.world.probe_volume(center - half, center + half);

        for actor in &caught {
            let flat = Vec3::new(actor.position.x - center.x, 0.0, actor.position.z - center.z);
            let damage = cfg.dual_slam_damage - cfg.dual_slam_falloff * flat.length();
            if damage > 0.0 {
                ctx.strike(actor.id, damage, AttackKind::DualSlam);
            }
            ctx.knock_back(actor, 2.0, 1.2);
            ctx.world
                .apply_debuff(actor.id, Debuff::new(DebuffKind::Slowness, 80, 3));
            ctx.world
                .apply_debuff(actor.id, Debuff::new(DebuffKind::Nausea, 60, 0));
        }
        debug!("Dual slam landed on {} actors", caught.len());
    }
}

impl BossTask for DualSlamTask {
    fn kind(&self) -> TaskKind {
        TaskKind::DualSlam
    }

    fn claims(&self) -> Option<AttackState> {
        Some(AttackState::DualSlam)
    }

    fn should_start(&mut self, ctx: &mut TaskCtx) -> bool {
        if !ready_to_attack(ctx) || ctx.state.timers.dual_slam_cooldown > 0 {
            return false;
        }
        let tuning = ctx.tuning;
        let in_reach = ctx
            .target()
            .is_some_and(|t| ctx.distance_to(&t) < tuning.melee.dual_slam_range);
        in_reach && ctx.rng.chance(tuning.melee.dual_slam_chance)
    }

    fn start(&mut self, ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        ctx.state.attack_state = AttackState::DualSlam;
        ctx.state.timers.animation = tuning.melee.dual_slam_animation;
        ctx.state.timers.dual_slam_cooldown = tuning.melee.dual_slam_cooldown;
        ctx.halt();
    }

    fn tick(&mut self, ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.melee;
        if let Some(target) = ctx.target() {
            ctx.face(target.position);
        }
        if ctx.state.timers.animation == cfg.dual_slam_animation - cfg.dual_slam_impact_delay {
            Self::impact(ctx);
        }
    }

    fn should_continue(&mut self, ctx: &mut TaskCtx) -> bool {
        ctx.state.attack_state == AttackState::DualSlam
            && ctx.state.timers.animation > 0
            && ctx.target().is_some()
    }

    fn stop(&mut self, ctx: &mut TaskCtx) {
        ctx.state.timers.animation = 0;
        ctx.state.attack_state = AttackState::Idle;
    }
}

/// Five escalating strikes, berserk only
pub struct BerserkComboTask;

impl BossTask for BerserkComboTask {
    fn kind(&self) -> TaskKind {
        TaskKind::BerserkCombo
    }

    fn claims(&self) -> Option<AttackState> {
        Some(AttackState::Combo)
    }

    fn should_start(&mut self, ctx: &mut TaskCtx) -> bool {
        if ctx.state.phase != Phase::Berserk
            || !ready_to_attack(ctx)
            || ctx.state.timers.attack_cooldown > 0
        {
            return false;
        }
        ctx.target()
            .is_some_and(|t| ctx.distance_to(&t) < ctx.tuning.melee.combo_range)
    }

    fn start(&mut self, ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        ctx.state.attack_state = AttackState::Combo;
        ctx.state.timers.animation = tuning.melee.combo_animation;
        ctx.state.timers.attack_cooldown = tuning.melee.combo_cooldown;
        ctx.halt();
    }

    fn tick(&mut self, ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.melee;
        let Some(target) = ctx.target() else {
            return;
        };

        let desired = yaw_towards(ctx.agent_position(), target.position);
        if angle_between(ctx.state.body.yaw, desired).abs() > cfg.combo_max_facing_error.to_radians() {
            ctx.state.body.yaw = desired;
            return;
        }

        let elapsed = cfg.combo_animation.saturating_sub(ctx.state.timers.animation);
        if elapsed == 0 || elapsed % cfg.combo_stage_interval != 0 {
            return;
        }
        let stage = elapsed / cfg.combo_stage_interval;
        if stage > cfg.combo_stages || ctx.distance_to(&target) >= cfg.combo_hit_range {
            return;
        }

        let stage = stage as f32;
        ctx.strike(
            target.id,
            tuning.stats.attack_damage * (1.0 + 0.15 * stage),
            AttackKind::BerserkCombo,
        );
        ctx.knock_back(&target, 0.2 + 0.1 * stage, 0.1 + 0.05 * stage);
    }

    fn should_continue(&mut self, ctx: &mut TaskCtx) -> bool {
        ctx.state.attack_state == AttackState::Combo
            && ctx.state.timers.animation > 0
            && ctx
                .target()
                .is_some_and(|t| ctx.distance_to(&t) < ctx.tuning.melee.combo_leash)
    }

    fn stop(&mut self, ctx: &mut TaskCtx) {
        ctx.state.timers.animation = 0;
        ctx.state.attack_state = AttackState::Idle;
    }
}

/// Sprinting charge with repeated hits, berserk only
#[derive(Default)]
pub struct RunningComboTask {
    elapsed: u32,
    landed: bool,
}

impl BossTask for RunningComboTask {
    fn kind(&self) -> TaskKind {
        TaskKind::RunningCombo
    }

    fn claims(&self) -> Option<AttackState> {
        Some(AttackState::RunningCombo)
    }

    fn should_start(&mut self, ctx: &mut TaskCtx) -> bool {
        if ctx.state.phase != Phase::Berserk
            || !ready_to_attack(ctx)
            || ctx.state.timers.attack_cooldown > 0
        {
            return false;
        }
        let tuning = ctx.tuning;
        ctx.target().is_some_and(|t| {
            let distance = ctx.distance_to(&t);
            distance > tuning.melee.running_min_distance && distance < tuning.melee.running_max_distance
        })
    }

    fn start(&mut self, ctx: &mut TaskCtx) {
        self.elapsed = 0;
        self.landed = false;
        ctx.state.attack_state = AttackState::RunningCombo;
    }

    fn tick(&mut self, ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.melee;
        let Some(target) = ctx.target() else {
            return;
        };
        self.elapsed += 1;

        let speed = (tuning.stats.move_speed + cfg.running_acceleration * self.elapsed as f32)
            .min(cfg.running_top_speed)
            * ctx.state.stats.speed;
        ctx.move_towards(target.position, speed);
        ctx.state.body.is_running = true;

        if ctx.distance_to(&target) < cfg.running_hit_range && self.elapsed % cfg.running_hit_interval == 0 {
            ctx.strike(
                target.id,
                tuning.stats.attack_damage * cfg.running_damage_factor,
                AttackKind::RunningCombo,
            );
            ctx.knock_back(&target, 0.4, 0.2);
            self.landed = true;
        }
    }

    fn should_continue(&mut self, ctx: &mut TaskCtx) -> bool {
        let cfg = &ctx.tuning.melee;
        if ctx.state.attack_state != AttackState::RunningCombo || self.elapsed >= cfg.running_max_ticks {
            return false;
        }
        match ctx.target() {
            Some(target) => {
                let distance = ctx.distance_to(&target);
                distance <= cfg.running_leash && !(self.landed && distance < cfg.running_finish_distance)
            }
            None => false,
        }
    }

    fn stop(&mut self, ctx: &mut TaskCtx) {
        self.elapsed = 0;
        self.landed = false;
        ctx.halt();
        ctx.state.timers.attack_cooldown = ctx.tuning.melee.running_cooldown;
        ctx.state.attack_state = AttackState::Idle;
    }
}
