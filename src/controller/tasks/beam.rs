//! Void beam
//!
//! `Off -> Warning -> Charging -> Firing -> Off`
//!
//! The agent is rooted for the whole channel and keeps facing the locked
//! target. Warning and charging cancel (without cooldown) as soon as the target
//! is lost, leaves range or breaks line of sight. Firing always runs to
//! completion: it ends when its timer expires or the target dies, and both
//! endings start the beam cooldown.
//!
//! Firing deals nothing during the grace window. After that, every
//! `damage_interval` steps the target is checked against the mitigation
//! capability: a guard turns the hit into chip damage plus knockback and costs
//! durability, no guard means full interval damage.

use bevy::prelude::*;

use crate::combat::events::ControllerEvent;
use crate::controller::scheduler::{BossTask, TaskCtx, TaskKind};
use crate::controller::state::{AttackState, BeamState};
use crate::controller::world::{AttackKind, Feedback, GuardOutcome, TargetInfo};

pub struct BeamTask;

impl BeamTask {
    /// Target still valid for the telegraph stages
    fn locked_target(ctx: &TaskCtx) -> Option<TargetInfo> {
        let info = ctx.valid_actor(ctx.state.beam_target?)?;
        let tuning = ctx.tuning;
        let cfg = &tuning.beam;
        let origin = ctx.agent_position();
        let distance = info.distance_to(origin);
        if distance <= cfg.range && ctx.world.can_see(origin, info.id) {
            Some(info)
        } else {
            None
        }
    }

    fn warning(ctx: &mut TaskCtx, target: &TargetInfo) {
        let tuning = ctx.tuning;
        let cfg = &tuning.beam;
        let remaining = ctx.state.timers.beam;

        if remaining == 0 {
            ctx.state.beam_state = BeamState::Charging;
            ctx.state.timers.beam = cfg.charge_ticks;
            debug!("Beam charging for {} steps", cfg.charge_ticks);
            return;
        }

        if remaining % cfg.warning_checkpoint == 0 {
            ctx.world
                .send_feedback(target.id, Feedback::BeamWarning { remaining });
        }
        if remaining == cfg.warning_checkpoint / 2 {
            ctx.world
                .send_feedback(target.id, Feedback::BeamUrgent { remaining });
        }
    }

    fn charging(ctx: &mut TaskCtx, target: &TargetInfo) {
        let tuning = ctx.tuning;
        let cfg = &tuning.beam;
        let remaining = ctx.state.timers.beam;

        if remaining == 0 {
            ctx.state.beam_state = BeamState::Firing;
            ctx.state.timers.beam = cfg.fire_ticks;
            info!("Void beam fired at {:?}", target.id);
            ctx.events.push(ControllerEvent::BeamFired {
                target: target.id,
                origin: ctx.state.body.position,
                end: target.position,
            });
            Self::firing(ctx);
            return;
        }

        let elapsed = cfg.charge_ticks.saturating_sub(remaining);
        if elapsed % cfg.charge_cue_interval == 0 {
            let intensity = elapsed as f32 / cfg.charge_ticks as f32;
            ctx.world
                .send_feedback(target.id, Feedback::BeamCharge { intensity });
        }
    }

    fn firing(ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.beam;
        let remaining = ctx.state.timers.beam;
        let elapsed = cfg.fire_ticks.saturating_sub(remaining);

        let Some(target) = ctx.state.beam_target.and_then(|id| ctx.valid_actor(id)) else {
            Self::finish(ctx);
            return;
        };
        ctx.root();
        ctx.face(target.position);

        if elapsed < cfg.grace_ticks {
            if elapsed % cfg.impact_warning_interval == 0 {
                ctx.world.send_feedback(
                    target.id,
                    Feedback::BeamImpactSoon {
                        remaining: cfg.grace_ticks - elapsed,
                    },
                );
            }
        } else if remaining % cfg.damage_interval == 0 {
            Self::apply_interval(ctx, &target);
        }

        let target_dead = ctx.valid_actor(target.id).is_none();
        if remaining == 0 || target_dead {
            Self::finish(ctx);
        }
    }

    fn apply_interval(ctx: &mut TaskCtx, target: &TargetInfo) {
        let tuning = ctx.tuning;
        let cfg = &tuning.beam;
        let origin = ctx.agent_position();
        if target.distance_to(origin) > cfg.range || !ctx.world.can_see(origin, target.id) {
            return;
        }

        if ctx.world.is_mitigating(target.id) {
            ctx.world
                .damage_actor(target.id, cfg.chip_damage, AttackKind::BeamChip);
            ctx.knock_back(target, cfg.knockback_horizontal, cfg.knockback_vertical);
            let outcome = ctx
                .world
                .consume_durability(target.id, cfg.guard_durability_cost);
            if outcome == GuardOutcome::Broken {
                ctx.world
                    .grant_hurt_immunity(target.id, cfg.stun_immunity_ticks);
                ctx.events
                    .push(ControllerEvent::GuardBroken { target: target.id });
            }
        } else {
            let amount = if cfg.unguarded_lethal {
                target.health.max(cfg.interval_damage)
            } else {
                cfg.interval_damage
            };
            ctx.world.damage_actor(target.id, amount, AttackKind::Beam);
        }

        let bystanders = ctx.world.actors_within(target.position, cfg.splash_radius);
        for other in bystanders.iter().filter(|o| o.id != target.id) {
            if !ctx.world.is_mitigating(other.id) {
                ctx.world
                    .damage_actor(other.id, cfg.splash_damage, AttackKind::BeamSplash);
            }
        }
    }

    /// Natural end of the firing window
    fn finish(ctx: &mut TaskCtx) {
        ctx.state.timers.beam_cooldown = ctx.tuning.beam.cooldown;
        ctx.state.timers.beam = 0;
        ctx.state.beam_state = BeamState::Off;
        ctx.state.attack_state = AttackState::Idle;
        ctx.state.beam_target = None;
        ctx.state.body.rooted = false;
        ctx.events
            .push(ControllerEvent::BeamEnded { completed: true });
    }
}

impl BossTask for BeamTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Beam
    }

    fn claims(&self) -> Option<AttackState> {
        Some(AttackState::Beam)
    }

    fn should_start(&mut self, ctx: &mut TaskCtx) -> bool {
        if !ctx.state.is_idle() || ctx.state.timers.beam_cooldown > 0 || ctx.state.grab.is_active()
        {
            return false;
        }
        let Some(target) = ctx.target() else {
            return false;
        };
        let tuning = ctx.tuning;
        let cfg = &tuning.beam;
        let distance = ctx.distance_to(&target);
        distance > cfg.min_range
            && distance < cfg.range
            && ctx.world.can_see(ctx.agent_position(), target.id)
    }

    fn start(&mut self, ctx: &mut TaskCtx) {
        let Some(target) = ctx.target() else {
            return;
        };
        ctx.state.attack_state = AttackState::Beam;
        ctx.state.beam_state = BeamState::Warning;
        ctx.state.timers.beam = ctx.tuning.beam.warning_ticks;
        ctx.state.beam_target = Some(target.id);
        ctx.root();
        ctx.face(target.position);
        info!("Void beam telegraphed at {:?}", target.id);
        ctx.events
            .push(ControllerEvent::BeamTelegraphed { target: target.id });
    }

    fn tick(&mut self, ctx: &mut TaskCtx) {
        match ctx.state.beam_state {
            BeamState::Warning | BeamState::Charging => {
                let Some(target) = Self::locked_target(ctx) else {
                    return;
                };
                ctx.root();
                ctx.face(target.position);
                if ctx.state.beam_state == BeamState::Warning {
                    Self::warning(ctx, &target);
                } else {
                    Self::charging(ctx, &target);
                }
            }
            BeamState::Firing => Self::firing(ctx),
            BeamState::Off => {}
        }
    }

    fn should_continue(&mut self, ctx: &mut TaskCtx) -> bool {
        match ctx.state.beam_state {
            BeamState::Off => false,
            BeamState::Firing => true,
            BeamState::Warning | BeamState::Charging => Self::locked_target(ctx).is_some(),
        }
    }

    fn stop(&mut self, ctx: &mut TaskCtx) {
        if ctx.state.beam_state != BeamState::Off {
            debug!("Void beam cancelled during {:?}", ctx.state.beam_state);
            ctx.events
                .push(ControllerEvent::BeamEnded { completed: false });
        }
        ctx.state.timers.beam = 0;
        ctx.state.beam_state = BeamState::Off;
        ctx.state.beam_target = None;
        ctx.state.attack_state = AttackState::Idle;
        ctx.state.body.rooted = false;
    }
}
