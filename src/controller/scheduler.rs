//! Task Scheduler
//!
//! Behaviors are registered as [`BossTask`] implementations with a priority
//! (lower runs first) and a set of [`MutexBits`] naming the resources they
//! claim. At most one task runs at a time.
//!
//! ## Arbitration, once per step
//!
//! 1. If the running task no longer wants to continue, stop it.
//! 2. If a task is still running, the first task of strictly higher priority
//!    that wants to start and whose bits overlap the running task's bits
//!    preempts it. The old task's `stop` completes before the new `start`.
//! 3. With nothing running, start the first task that wants to.
//! 4. Tick the running task, including one started this step.
//!
//! Higher-priority tasks whose bits do not overlap the running task wait for
//! it to finish; tasks never run side by side.

use bevy::prelude::*;

use super::rng::GameRng;
use super::state::{AgentState, AttackState};
use super::tuning::BossTuning;
use super::world::{horizontal_direction, yaw_towards, AttackKind, BossWorld, EntityRef, TargetInfo};
use crate::combat::events::ControllerEvent;

/// Identifies a registered behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Beam,
    Burst,
    Grab,
    RunningCombo,
    LeftHand,
    BerserkCombo,
    Slash,
    DualSlam,
    Chase,
    Wander,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Beam => "Void Beam",
            TaskKind::Burst => "Void Burst",
            TaskKind::Grab => "Grab",
            TaskKind::RunningCombo => "Running Combo",
            TaskKind::LeftHand => "Left Hand",
            TaskKind::BerserkCombo => "Berserk Combo",
            TaskKind::Slash => "Slash",
            TaskKind::DualSlam => "Dual Slam",
            TaskKind::Chase => "Chase",
            TaskKind::Wander => "Wander",
        }
    }
}

/// Shared resources a task claims while running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutexBits(u8);

impl MutexBits {
    pub const NONE: MutexBits = MutexBits(0);
    pub const MOVE: MutexBits = MutexBits(0b001);
    pub const LOOK: MutexBits = MutexBits(0b010);
    pub const WEAPON: MutexBits = MutexBits(0b100);
    /// Everything an attack needs
    pub const ATTACK: MutexBits = MutexBits(0b111);

    pub const fn union(self, other: MutexBits) -> MutexBits {
        MutexBits(self.0 | other.0)
    }

    pub const fn intersects(self, other: MutexBits) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Everything a task may touch during one call
pub struct TaskCtx<'a> {
    pub state: &'a mut AgentState,
    pub tuning: &'a BossTuning,
    pub world: &'a mut dyn BossWorld,
    pub rng: &'a mut GameRng,
    pub events: &'a mut Vec<ControllerEvent>,
}

impl<'a> TaskCtx<'a> {
    /// Current attack target, if it still exists and is alive
    pub fn target(&self) -> Option<TargetInfo> {
        self.valid_actor(self.state.attack_target?)
    }

    pub fn valid_actor(&self, id: EntityRef) -> Option<TargetInfo> {
        self.world.actor(id).filter(|info| info.alive)
    }

    pub fn agent_position(&self) -> Vec3 {
        self.state.body.position
    }

    pub fn distance_to(&self, info: &TargetInfo) -> f32 {
        info.distance_to(self.state.body.position)
    }

    pub fn face(&mut self, point: Vec3) {
        let from = self.state.body.position;
        if horizontal_direction(from, point) != Vec3::ZERO {
            self.state.body.yaw = yaw_towards(from, point);
        }
    }

    /// Pin the agent in place for this step
    pub fn root(&mut self) {
        self.state.body.rooted = true;
        self.set_velocity(Vec3::ZERO);
    }

    pub fn halt(&mut self) {
        self.set_velocity(Vec3::ZERO);
    }

    /// Walk towards `point` at `speed` units per step
    pub fn move_towards(&mut self, point: Vec3, speed: f32) {
        let direction = horizontal_direction(self.state.body.position, point);
        self.face(point);
        self.set_velocity(direction * speed);
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        let body = &mut self.state.body;
        body.velocity = velocity;
        body.is_moving = velocity.x != 0.0 || velocity.z != 0.0;
        if !body.is_moving {
            body.is_running = false;
        }
        self.world.set_agent_velocity(velocity);
    }

    /// Deal melee-scaled damage to an actor
    pub fn strike(&mut self, id: EntityRef, base: f32, kind: AttackKind) {
        let amount = base * self.state.stats.damage;
        self.world.damage_actor(id, amount, kind);
    }

    /// Horizontal knockback away from the agent, plus lift
    pub fn knock_back(&mut self, info: &TargetInfo, horizontal: f32, vertical: f32) {
        let away = horizontal_direction(self.state.body.position, info.position);
        self.world
            .push_actor(info.id, away * horizontal + Vec3::Y * vertical);
    }
}

/// One behavior, driven by the scheduler
pub trait BossTask: Send + Sync {
    fn kind(&self) -> TaskKind;

    /// Attack state owned while running; used to re-attach a restored channel
    fn claims(&self) -> Option<AttackState> {
        None
    }

    fn should_start(&mut self, ctx: &mut TaskCtx) -> bool;

    fn start(&mut self, ctx: &mut TaskCtx);

    fn tick(&mut self, ctx: &mut TaskCtx);

    fn should_continue(&mut self, ctx: &mut TaskCtx) -> bool;

    /// Tear down. Must leave the agent idle and reset per-run counters.
    fn stop(&mut self, ctx: &mut TaskCtx);
}

struct TaskEntry {
    priority: u8,
    mutex: MutexBits,
    task: Box<dyn BossTask>,
}

/// Ordered task list with a single running slot
#[derive(Default)]
pub struct TaskScheduler {
    entries: Vec<TaskEntry>,
    running: Option<usize>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Equal priorities are a configuration error and resolve by
    /// registration order.
    pub fn register(&mut self, priority: u8, mutex: MutexBits, task: Box<dyn BossTask>) {
        if let Some(existing) = self.entries.iter().find(|e| e.priority == priority) {
            warn!(
                "Tasks {} and {} share priority {}; registration order decides",
                existing.task.kind().name(),
                task.kind().name(),
                priority
            );
        }
        let index = self
            .entries
            .iter()
            .position(|e| e.priority > priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            index,
            TaskEntry {
                priority,
                mutex,
                task,
            },
        );
        if let Some(running) = self.running.as_mut() {
            if *running >= index {
                *running += 1;
            }
        }
    }

    pub fn running(&self) -> Option<TaskKind> {
        self.running.map(|i| self.entries[i].task.kind())
    }

    pub fn running_mutex(&self) -> MutexBits {
        self.running
            .map(|i| self.entries[i].mutex)
            .unwrap_or(MutexBits::NONE)
    }

    /// Registered task kinds in evaluation order
    pub fn order(&self) -> Vec<(u8, TaskKind)> {
        self.entries
            .iter()
            .map(|e| (e.priority, e.task.kind()))
            .collect()
    }

    /// Run one arbitration step and tick the running task
    pub fn step(&mut self, ctx: &mut TaskCtx) {
        self.adopt_restored(ctx);

        if let Some(index) = self.running {
            if !self.entries[index].task.should_continue(ctx) {
                self.stop_running(ctx);
            }
        }

        if let Some(index) = self.running {
            let priority = self.entries[index].priority;
            let mutex = self.entries[index].mutex;
            let preemptor = (0..index).find(|&i| {
                let entry = &mut self.entries[i];
                entry.priority < priority
                    && entry.mutex.intersects(mutex)
                    && entry.task.should_start(ctx)
            });
            if let Some(next) = preemptor {
                self.stop_running(ctx);
                self.start(next, ctx);
            }
        } else {
            let next = (0..self.entries.len()).find(|&i| self.entries[i].task.should_start(ctx));
            if let Some(next) = next {
                self.start(next, ctx);
            }
        }

        if let Some(index) = self.running {
            self.entries[index].task.tick(ctx);
        }
    }

    /// Stop whatever is running
    pub fn stop_running(&mut self, ctx: &mut TaskCtx) {
        if let Some(index) = self.running.take() {
            let task = &mut self.entries[index].task;
            task.stop(ctx);
            debug!("Task stopped: {}", task.kind().name());
            ctx.events.push(ControllerEvent::TaskStopped { task: task.kind() });
        }
    }

    fn start(&mut self, index: usize, ctx: &mut TaskCtx) {
        let task = &mut self.entries[index].task;
        task.start(ctx);
        debug!("Task started: {}", task.kind().name());
        ctx.events.push(ControllerEvent::TaskStarted { task: task.kind() });
        self.running = Some(index);
    }

    /// A restored snapshot can leave a channel mid-flight with no task
    /// running. Hand it back to the task that owns that attack state.
    fn adopt_restored(&mut self, ctx: &mut TaskCtx) {
        if self.running.is_some() || ctx.state.is_idle() {
            return;
        }
        let attack = ctx.state.attack_state;
        match self
            .entries
            .iter()
            .position(|e| e.task.claims() == Some(attack))
        {
            Some(index) => {
                debug!("Resuming {:?} with {}", attack, self.entries[index].task.kind().name());
                self.running = Some(index);
            }
            None => {
                warn!("No task owns attack state {:?}; returning to idle", attack);
                ctx.state.attack_state = AttackState::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutex_bits() {
        assert!(MutexBits::ATTACK.intersects(MutexBits::MOVE));
        assert!(!MutexBits::MOVE.intersects(MutexBits::LOOK));
        assert_eq!(MutexBits::MOVE.union(MutexBits::LOOK).bits(), 0b011);
        assert!(!MutexBits::NONE.intersects(MutexBits::ATTACK));
    }
}
