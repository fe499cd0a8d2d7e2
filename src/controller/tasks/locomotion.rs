//! Chasing and wandering
//!
//! These only claim movement (and look, for chase), so any attack preempts
//! them the moment it becomes eligible.

use bevy::prelude::*;
use std::f32::consts::TAU;

use crate::controller::scheduler::{BossTask, TaskCtx, TaskKind};
use crate::controller::world::look_vector;

/// Close distance to the current target
pub struct ChaseTask;

impl ChaseTask {
    fn should_chase(ctx: &TaskCtx) -> bool {
        ctx.state.is_idle()
            && ctx
                .target()
                .is_some_and(|t| ctx.distance_to(&t) > ctx.tuning.stats.chase_stop_distance)
    }
}

impl BossTask for ChaseTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Chase
    }

    fn should_start(&mut self, ctx: &mut TaskCtx) -> bool {
        Self::should_chase(ctx)
    }

    fn start(&mut self, _ctx: &mut TaskCtx) {}

    fn tick(&mut self, ctx: &mut TaskCtx) {
        let Some(target) = ctx.target() else {
            return;
        };
        let stats = &ctx.tuning.stats;
        let running = ctx.distance_to(&target) > stats.run_distance;
        let base = if running { stats.run_speed } else { stats.move_speed };
        let speed = base * ctx.state.stats.speed;
        ctx.move_towards(target.position, speed);
        ctx.state.body.is_running = running;
    }

    fn should_continue(&mut self, ctx: &mut TaskCtx) -> bool {
        Self::should_chase(ctx)
    }

    fn stop(&mut self, ctx: &mut TaskCtx) {
        ctx.halt();
    }
}

/// Aimless roaming while nothing is hostile
#[derive(Default)]
pub struct WanderTask {
    destination: Vec3,
    elapsed: u32,
}

impl BossTask for WanderTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Wander
    }

    fn should_start(&mut self, ctx: &mut TaskCtx) -> bool {
        ctx.state.is_idle()
            && ctx.state.attack_target.is_none()
            && ctx.rng.chance(ctx.tuning.stats.wander_chance)
    }

    fn start(&mut self, ctx: &mut TaskCtx) {
        let heading = ctx.rng.random_range(0.0, TAU);
        let distance = ctx.rng.random_range(2.0, ctx.tuning.stats.wander_radius.max(2.0));
        self.destination = ctx.agent_position() + look_vector(heading) * distance;
        self.elapsed = 0;
    }

    fn tick(&mut self, ctx: &mut TaskCtx) {
        self.elapsed += 1;
        let stats = &ctx.tuning.stats;
        let speed = stats.move_speed * stats.wander_speed_factor * ctx.state.stats.speed;
        ctx.move_towards(self.destination, speed);
    }

    fn should_continue(&mut self, ctx: &mut TaskCtx) -> bool {
        let here = ctx.agent_position();
        let remaining = Vec3::new(self.destination.x - here.x, 0.0, self.destination.z - here.z);
        ctx.state.is_idle()
            && ctx.state.attack_target.is_none()
            && self.elapsed < ctx.tuning.stats.wander_max_ticks
            && remaining.length() > 1.0
    }

    fn stop(&mut self, ctx: &mut TaskCtx) {
        self.elapsed = 0;
        ctx.halt();
    }
}
