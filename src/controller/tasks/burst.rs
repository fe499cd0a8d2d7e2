//! Void burst
//!
//! `Charging -> (detonate) -> Lingering -> Idle`
//!
//! Only available in the lower half of the health bar. Once the charge begins
//! it always completes; losing the target does not cancel it.

use bevy::prelude::*;

use crate::combat::events::ControllerEvent;
use crate::controller::scheduler::{BossTask, TaskCtx, TaskKind};
use crate::controller::state::{AttackState, BurstStage};
use crate::controller::world::{AttackKind, Debuff, DebuffKind, Feedback};

pub struct BurstTask;

/// Linear falloff from 1 at the centre to 0 at `radius`
fn falloff(distance: f32, radius: f32) -> f32 {
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

impl BurstTask {
    fn charging(ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.burst;
        ctx.root();

        let remaining = ctx.state.timers.burst_charge;
        if remaining == 0 {
            Self::detonate(ctx);
            return;
        }

        let elapsed = cfg.charge_ticks.saturating_sub(remaining);
        if elapsed % cfg.charge_cue_interval == 0 {
            let progress = elapsed as f32 / cfg.charge_ticks as f32;
            let nearby = ctx.world.actors_within(ctx.agent_position(), cfg.radius);
            for actor in &nearby {
                ctx.world
                    .send_feedback(actor.id, Feedback::BurstCharging { progress });
            }
        }
    }

    fn detonate(ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.burst;
        let center = ctx.agent_position();
        let caught = ctx.world.actors_within(center, cfg.radius);

        for actor in &caught {
            let scale = falloff(actor.distance_to(center), cfg.radius);
            let damage = cfg.detonate_damage * scale;
            if damage > 0.0 {
                ctx.world.damage_actor(actor.id, damage, AttackKind::Burst);
            }
            ctx.knock_back(actor, cfg.knockback * scale, cfg.knockback_vertical);
            for debuff in [
                Debuff::new(DebuffKind::Wither, 200, 2),
                Debuff::new(DebuffKind::Blindness, 100, 0),
                Debuff::new(DebuffKind::Slowness, 150, 2),
                Debuff::new(DebuffKind::Nausea, 80, 1),
            ] {
                ctx.world.apply_debuff(actor.id, debuff);
            }
        }

        info!("Void burst detonated, {} actors caught", caught.len());
        ctx.events.push(ControllerEvent::BurstDetonated { hits: caught.len() });
        ctx.state.burst_stage = BurstStage::Lingering;
        ctx.state.timers.burst_linger = cfg.linger_ticks;
        ctx.state.body.rooted = false;
    }

    fn lingering(ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        let cfg = &tuning.burst;
        let remaining = ctx.state.timers.burst_linger;

        if remaining % cfg.linger_interval == 0 {
            let center = ctx.agent_position();
            let caught = ctx.world.actors_within(center, cfg.linger_radius);
            for actor in &caught {
                let damage = cfg.linger_damage * falloff(actor.distance_to(center), cfg.linger_radius);
                if damage > 0.0 {
                    ctx.world.damage_actor(actor.id, damage, AttackKind::BurstLinger);
                }
                ctx.world
                    .apply_debuff(actor.id, Debuff::new(DebuffKind::Wither, 40, 0));
            }
        }

        if remaining == 0 {
            ctx.state.burst_stage = BurstStage::Off;
            ctx.state.attack_state = AttackState::Idle;
        }
    }
}

impl BossTask for BurstTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Burst
    }

    fn claims(&self) -> Option<AttackState> {
        Some(AttackState::Burst)
    }

    fn should_start(&mut self, ctx: &mut TaskCtx) -> bool {
        let tuning = ctx.tuning;
        if !ctx.state.is_idle()
            || ctx.state.timers.special_cooldown > 0
            || ctx.state.health_ratio() > tuning.burst.health_threshold
        {
            return false;
        }
        ctx.target()
            .is_some_and(|target| ctx.distance_to(&target) <= tuning.burst.radius)
    }

    fn start(&mut self, ctx: &mut TaskCtx) {
        let tuning = ctx.tuning;
        ctx.state.attack_state = AttackState::Burst;
        ctx.state.burst_stage = BurstStage::Charging;
        ctx.state.timers.burst_charge = tuning.burst.charge_ticks;
        ctx.state.timers.special_cooldown = tuning.burst.cooldown;
        ctx.root();
        info!("Void burst charging for {} steps", tuning.burst.charge_ticks);
        ctx.events.push(ControllerEvent::BurstCharging);
    }

    fn tick(&mut self, ctx: &mut TaskCtx) {
        match ctx.state.burst_stage {
            BurstStage::Charging => Self::charging(ctx),
            BurstStage::Lingering => Self::lingering(ctx),
            BurstStage::Off => {}
        }
    }

    fn should_continue(&mut self, ctx: &mut TaskCtx) -> bool {
        ctx.state.burst_stage != BurstStage::Off
    }

    fn stop(&mut self, ctx: &mut TaskCtx) {
        ctx.state.burst_stage = BurstStage::Off;
        ctx.state.timers.burst_charge = 0;
        ctx.state.timers.burst_linger = 0;
        ctx.state.attack_state = AttackState::Idle;
        ctx.state.body.rooted = false;
    }
}
