//! Grab and throw
//!
//! `Extending -> Attached -> (Release | Throw)`
//!
//! The arm extends for a fixed time, then probes a box along the look vector.
//! A captured actor is spring-pulled towards a hold point in front of the
//! agent, squeezed periodically, and eventually thrown or released.

use bevy::prelude::*;

use crate::combat::events::ControllerEvent;
use crate::controller::scheduler::{BossTask, TaskCtx, TaskKind};
use crate::controller::state::{AttackState, GrabPhase};
use crate::controller::world::{
    horizontal_direction, look_vector, AttackKind, Debuff, DebuffKind, Feedback, TargetInfo,
};

pub struct GrabTask;

impl GrabTask {
    fn probe(ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.grab;
        let origin = ctx.agent_position();
        let look = look_vector(ctx.state.body.yaw);
        let end = origin + look * cfg.reach;
        let min = origin.min(end) - Vec3::ONE;
        let max = origin.max(end) + Vec3::ONE;

        let captured = ctx
            .world
            .probe_volume(min, max)
            .into_iter()
            .filter(|c| c.distance_to(origin) <= cfg.reach)
            .min_by(|a, b| a.distance_to(origin).total_cmp(&b.distance_to(origin)));

        match captured {
            Some(target) => {
                let grab = &mut ctx.state.grab;
                grab.phase = GrabPhase::Attached;
                grab.target = Some(target.id);
                grab.duration_ticks = 0;
                grab.attach_offset = look * cfg.hold_distance + Vec3::Y * cfg.hold_height;
                ctx.world.apply_debuff(
                    target.id,
                    Debuff::new(DebuffKind::Slowness, cfg.max_duration, 10),
                );
                ctx.world.send_feedback(target.id, Feedback::Grabbed);
                info!("Grab caught {:?}", target.id);
                ctx.events
                    .push(ControllerEvent::GrabAttached { target: target.id });
            }
            None => {
                debug!("Grab probe found nothing");
                ctx.state.grab.clear();
                ctx.state.attack_state = AttackState::Idle;
            }
        }
    }

    fn hold(ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.grab;
        ctx.state.grab.duration_ticks += 1;
        let duration = ctx.state.grab.duration_ticks;

        let Some(target) = ctx.state.grab.target.and_then(|id| ctx.valid_actor(id)) else {
            Self::release(ctx, false);
            return;
        };
        if ctx.distance_to(&target) > cfg.release_distance || duration >= cfg.max_duration {
            Self::release(ctx, false);
            return;
        }

        ctx.halt();
        ctx.face(target.position);
        let anchor = ctx.agent_position() + ctx.state.grab.attach_offset;
        let pull = (anchor - target.position) * cfg.pull_strength;
        ctx.world.set_actor_velocity(target.id, pull);

        if duration % cfg.damage_interval == 0 {
            ctx.world
                .damage_actor(target.id, cfg.damage, AttackKind::GrabSqueeze);
            ctx.world
                .apply_debuff(target.id, Debuff::new(DebuffKind::Weakness, 40, 1));
            if ctx.valid_actor(target.id).is_none() {
                Self::release(ctx, false);
                return;
            }
        }

        if duration >= cfg.throw_after && ctx.rng.chance(cfg.throw_chance) {
            Self::throw(ctx, &target);
        }
    }

    fn throw(ctx: &mut TaskCtx, captured: &TargetInfo) {
        let tuning = ctx.tuning;
        let cfg = &tuning.grab;
        let direction = ctx
            .target()
            .filter(|hostile| hostile.id != captured.id)
            .map(|hostile| horizontal_direction(captured.position, hostile.position))
            .filter(|dir| *dir != Vec3::ZERO)
            .unwrap_or_else(|| look_vector(ctx.state.body.yaw));

        let impulse = direction * cfg.throw_horizontal + Vec3::Y * cfg.throw_vertical;
        ctx.world.set_actor_velocity(captured.id, impulse);
        ctx.world
            .damage_actor(captured.id, cfg.throw_damage, AttackKind::Throw);
        Self::release(ctx, true);
    }

    fn release(ctx: &mut TaskCtx, thrown: bool) {
        let grab = ctx.state.grab;
        if let Some(target) = grab.target {
            debug!(
                "Grab released {:?} after {} steps (thrown: {})",
                target, grab.duration_ticks, thrown
            );
            ctx.events.push(ControllerEvent::GrabReleased {
                target,
                thrown,
                held_ticks: grab.duration_ticks,
            });
        }
        ctx.state.grab.clear();
        ctx.state.attack_state = AttackState::Idle;
    }
}

impl BossTask for GrabTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Grab
    }

    fn claims(&self) -> Option<AttackState> {
        Some(AttackState::Grab)
    }

    fn should_start(&mut self, ctx: &mut TaskCtx) -> bool {
        let state = &ctx.state;
        if !state.is_idle()
            || state.grab.is_active()
            || state.timers.attack_cooldown > 0
            || state.gate.is_open()
        {
            return false;
        }
        let Some(target) = ctx.target() else {
            return false;
        };
        let tuning = ctx.tuning;
        let distance = ctx.distance_to(&target);
        distance >= tuning.grab.min_distance
            && distance <= tuning.grab.reach
            && ctx.rng.chance(tuning.grab.chance)
    }

    fn start(&mut self, ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        ctx.state.attack_state = AttackState::Grab;
        ctx.state.grab.clear();
        ctx.state.grab.phase = GrabPhase::Extending;
        ctx.state.timers.grab_extend = tuning.grab.extend_ticks;
        ctx.state.timers.attack_cooldown = tuning.grab.cooldown;
        ctx.state.timers.animation = tuning.grab.animation_ticks;
        ctx.halt();
        if let Some(target) = ctx.target() {
            ctx.face(target.position);
        }
    }

    fn tick(&mut self, ctx: &mut TaskCtx) {
        match ctx.state.grab.phase {
            GrabPhase::Extending => {
                ctx.halt();
                if let Some(target) = ctx.target() {
                    ctx.face(target.position);
                }
                if ctx.state.timers.grab_extend == 0 {
                    Self::probe(ctx);
                }
            }
            GrabPhase::Attached => Self::hold(ctx),
            GrabPhase::Inactive => {}
        }
    }

    fn should_continue(&mut self, ctx: &mut TaskCtx) -> bool {
        match ctx.state.grab.phase {
            GrabPhase::Inactive => false,
            // Hold checks its own captive every step.
            GrabPhase::Attached => true,
            GrabPhase::Extending => ctx.target().is_some(),
        }
    }

    fn stop(&mut self, ctx: &mut TaskCtx) {
        if ctx.state.grab.is_active() {
            Self::release(ctx, false);
        }
        ctx.state.timers.grab_extend = 0;
        ctx.state.attack_state = AttackState::Idle;
    }
}
