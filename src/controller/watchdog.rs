//! Target acquisition and stuck recovery
//!
//! Neither of these is a scheduled task: they run every step around the
//! scheduler so that no behavior can starve them.

use bevy::prelude::*;
use std::f32::consts::TAU;

use super::scheduler::TaskCtx;
use super::world::{look_vector, TargetInfo};
use crate::combat::events::ControllerEvent;

/// Keep, replace or drop the attack target
pub fn update_target(ctx: &mut TaskCtx) {
    let tuning = ctx.tuning;
    let follow = tuning.stats.follow_range;
    let origin = ctx.agent_position();

    if let Some(current) = ctx.state.attack_target {
        let keep = ctx
            .valid_actor(current)
            .is_some_and(|t| t.distance_to(origin) <= follow);
        if keep {
            ctx.state.no_target_ticks = 0;
            return;
        }
        debug!("Lost target {:?}", current);
        ctx.state.attack_target = None;
        ctx.events.push(ControllerEvent::TargetLost { target: current });
    }

    let retaliate = ctx
        .state
        .last_attacker
        .and_then(|id| ctx.valid_actor(id))
        .filter(|t| t.distance_to(origin) <= follow);

    let chosen = retaliate.or_else(|| {
        ctx.world
            .actors_within(origin, follow)
            .into_iter()
            .filter(|t| ctx.world.can_see(origin, t.id))
            .min_by(|a, b| a.distance_to(origin).total_cmp(&b.distance_to(origin)))
    });

    if let Some(target) = chosen {
        acquire(ctx, &target);
        return;
    }

    ctx.state.no_target_ticks += 1;
    if ctx.state.no_target_ticks > tuning.watchdog.no_target_ticks {
        ctx.state.no_target_ticks = 0;
        // Sight is ignored here: anything in range beats standing around.
        let nearby = ctx.world.actors_within(origin, follow);
        if let Some(index) = ctx.rng.pick_index(nearby.len()) {
            acquire(ctx, &nearby[index]);
        }
    }
}

fn acquire(ctx: &mut TaskCtx, target: &TargetInfo) {
    info!("Boss targeting {:?}", target.id);
    ctx.state.attack_target = Some(target.id);
    ctx.state.no_target_ticks = 0;
    ctx.events
        .push(ControllerEvent::TargetAcquired { target: target.id });
}

/// Detect a boss that keeps trying to move without getting anywhere.
///
/// `was_moving` is the movement request from the previous step, whose result
/// is visible in the position read at the start of this one.
pub fn check_stuck(ctx: &mut TaskCtx, was_moving: bool) {
    let tuning = ctx.tuning;
    let cfg = &tuning.watchdog;
    let cell = ctx.agent_position().floor().as_ivec3();

    if !was_moving || ctx.state.body.rooted || cell != ctx.state.last_cell {
        ctx.state.stuck_ticks = 0;
        ctx.state.last_cell = cell;
        return;
    }
    ctx.state.stuck_ticks += 1;
    let stuck = ctx.state.stuck_ticks;

    if stuck > cfg.stuck_reset_ticks {
        ctx.state.stuck_ticks = 0;
        let mut teleported = false;
        if ctx.rng.chance(cfg.teleport_chance) {
            if let Some(target) = ctx.target() {
                let heading = ctx.rng.random_range(0.0, TAU);
                let distance = ctx
                    .rng
                    .random_range(cfg.teleport_min_distance, cfg.teleport_max_distance);
                let destination = target.position + look_vector(heading) * distance;
                if ctx.world.teleport_agent(destination) {
                    ctx.state.body.position = destination;
                    ctx.state.last_cell = destination.floor().as_ivec3();
                    teleported = true;
                }
            }
        }
        info!("Stuck watchdog reset (teleported: {})", teleported);
        ctx.events.push(ControllerEvent::Unstuck { teleported });
    } else if stuck == cfg.stuck_nudge_ticks + 1 {
        let heading = ctx.rng.random_range(0.0, TAU);
        let velocity = ctx.state.body.velocity + look_vector(heading) * cfg.nudge_strength;
        ctx.set_velocity(velocity);
    } else if stuck > cfg.stuck_halt_ticks {
        let mut velocity = ctx.state.body.velocity;
        velocity.y = 0.0;
        ctx.set_velocity(velocity);
    }
}
