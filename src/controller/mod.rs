//! Boss Controller
//!
//! A step-driven behavior controller for a single hostile agent. The host
//! calls [`BossController::step`] once per simulation tick and reports hits
//! through [`BossController::on_incoming_damage`]; everything else happens
//! inside the step.
//!
//! ## Architecture
//!
//! - [`timers`]: countdown integers for cooldowns and channels
//! - [`gate`]: the damage gate, which turns bursts of damage into fixed chunks
//! - [`tasks`]: the beam, grab, burst, melee and locomotion behaviors
//! - [`scheduler`]: priority and mutex arbitration over the tasks
//! - [`phase`]: health-driven escalation
//! - [`watchdog`]: target acquisition and stuck recovery
//! - [`persist`]: flat snapshots for save and restore
//!
//! ## Step Order
//!
//! 1. Queued hits resolve against the gate
//! 2. Timers tick down
//! 3. Gate housekeeping pins health and releases chunks
//! 4. Defeat check
//! 5. Target acquisition
//! 6. Phase evaluation (berserk entry fires a shockwave)
//! 7. Scheduler arbitration and the running task's tick
//! 8. Stuck watchdog
//!
//! The controller never touches the world outside [`BossWorld`]. It can be
//! driven by the headless arena, a test double, or a game engine adapter.

pub mod gate;
pub mod persist;
pub mod phase;
pub mod rng;
pub mod scheduler;
pub mod state;
pub mod tasks;
pub mod timers;
pub mod tuning;
pub mod watchdog;
pub mod world;

use bevy::prelude::*;

use crate::combat::events::ControllerEvent;
use gate::{DamageOutcome, DamageSource};
use persist::Snapshot;
use rng::GameRng;
use scheduler::{TaskCtx, TaskKind, TaskScheduler};
use state::{AgentState, AttackState, BeamState, BurstStage, Phase};
use tuning::BossTuning;
use world::{horizontal_direction, BossWorld, EntityRef};

/// Read-only view for animation, sound and UI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentationView {
    pub attack_state: AttackState,
    pub beam_state: BeamState,
    pub burst_stage: BurstStage,
    pub phase: Phase,
    pub is_moving: bool,
    pub is_running: bool,
    pub is_invulnerable: bool,
    /// Beam or burst is winding up
    pub is_charging: bool,
    /// Actor currently held by the grab
    pub grabbed: Option<EntityRef>,
    pub health: f32,
    pub max_health: f32,
    pub defeated: bool,
}

/// The per-agent controller. Single writer of its [`AgentState`].
#[derive(Component)]
pub struct BossController {
    state: AgentState,
    tuning: BossTuning,
    scheduler: TaskScheduler,
    rng: GameRng,
    queued: Vec<(f32, DamageSource)>,
    events: Vec<ControllerEvent>,
    tick: u64,
}

impl BossController {
    pub fn new(tuning: BossTuning, rng: GameRng) -> Self {
        Self::with_scheduler(tuning, rng, tasks::standard_scheduler())
    }

    /// Controller with default tuning and a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(BossTuning::default(), GameRng::from_seed(seed))
    }

    /// Controller running a custom task roster
    pub fn with_scheduler(tuning: BossTuning, rng: GameRng, scheduler: TaskScheduler) -> Self {
        Self {
            state: AgentState::new(&tuning),
            tuning,
            scheduler,
            rng,
            queued: Vec::new(),
            events: Vec::new(),
            tick: 0,
        }
    }

    /// Advance the controller by one simulation step
    pub fn step(&mut self, world: &mut dyn BossWorld) {
        if self.state.defeated {
            return;
        }
        self.tick += 1;

        self.state.body.position = world.agent_position();
        self.state.body.rooted = false;
        let was_moving = self.state.body.is_moving;

        for (amount, source) in std::mem::take(&mut self.queued) {
            self.on_incoming_damage(amount, source);
        }

        self.state.timers.tick();
        gate::housekeeping(&mut self.state, &self.tuning, &mut self.events);

        let mut ctx = TaskCtx {
            state: &mut self.state,
            tuning: &self.tuning,
            world,
            rng: &mut self.rng,
            events: &mut self.events,
        };

        if ctx.state.health <= 0.0 {
            Self::defeat(&mut self.scheduler, &mut ctx);
            return;
        }

        decay_left_hand_combo(&mut ctx);
        watchdog::update_target(&mut ctx);

        for (from, to) in phase::evaluate(ctx.state, ctx.tuning) {
            ctx.events.push(ControllerEvent::PhaseChanged { from, to });
            if to == Phase::Berserk {
                berserk_shockwave(&mut ctx);
            }
        }

        self.scheduler.step(&mut ctx);
        watchdog::check_stuck(&mut ctx, was_moving);
    }

    fn defeat(scheduler: &mut TaskScheduler, ctx: &mut TaskCtx) {
        scheduler.stop_running(ctx);
        ctx.halt();
        ctx.state.attack_state = AttackState::Idle;
        ctx.state.beam_state = BeamState::Off;
        ctx.state.burst_stage = BurstStage::Off;
        ctx.state.defeated = true;
        info!("Boss defeated");
        ctx.events.push(ControllerEvent::Defeated);
    }

    /// Resolve a hit immediately against the gate
    pub fn on_incoming_damage(&mut self, amount: f32, source: DamageSource) -> DamageOutcome {
        if let Some(attacker) = source.attacker() {
            if !self.state.defeated {
                self.state.last_attacker = Some(attacker);
            }
        }
        gate::receive_damage(&mut self.state, &self.tuning, amount, source, &mut self.events)
    }

    /// Hold a hit until the next step, resolved in arrival order
    pub fn queue_damage(&mut self, amount: f32, source: DamageSource) {
        self.queued.push((amount, source));
    }

    /// Apply a heal. Refused while the gate is open or after defeat.
    pub fn on_heal(&mut self, amount: f32) -> bool {
        if self.is_defeated() || !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        if !gate::accepts_heal(&self.state) {
            self.events.push(ControllerEvent::HealRejected { amount });
            return false;
        }
        self.state.health = (self.state.health + amount).min(self.state.max_health);
        true
    }

    pub fn view(&self) -> PresentationView {
        let state = &self.state;
        PresentationView {
            attack_state: state.attack_state,
            beam_state: state.beam_state,
            burst_stage: state.burst_stage,
            phase: state.phase,
            is_moving: state.body.is_moving,
            is_running: state.body.is_running,
            is_invulnerable: state.gate.is_open(),
            is_charging: matches!(state.beam_state, BeamState::Warning | BeamState::Charging)
                || state.burst_stage == BurstStage::Charging,
            grabbed: state.grab.target.filter(|_| state.grab.is_active()),
            health: state.health,
            max_health: state.max_health,
            defeated: self.is_defeated(),
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Direct access for hosts and tests. Out-of-range values are clamped at
    /// the next step.
    pub fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }

    pub fn tuning(&self) -> &BossTuning {
        &self.tuning
    }

    pub fn snapshot(&self) -> Snapshot {
        persist::capture(&self.state)
    }

    /// Replace the live state with a snapshot. A channel in progress is
    /// picked up by its task on the next step.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        let position = self.state.body.position;
        self.state = persist::restore(snapshot, &self.tuning);
        self.state.body.position = position;
        self.state.last_cell = position.floor().as_ivec3();
        self.scheduler = tasks::standard_scheduler();
        self.queued.clear();
        debug!("Restored boss state ({} fields)", snapshot.len());
    }

    /// Back to full health, Normal phase, idle, no timers running
    pub fn respawn(&mut self) {
        let body = self.state.body;
        self.state = AgentState::new(&self.tuning);
        self.state.body.position = body.position;
        self.state.body.yaw = body.yaw;
        self.state.last_cell = body.position.floor().as_ivec3();
        self.scheduler = tasks::standard_scheduler();
        self.queued.clear();
        info!("Boss respawned");
        self.events.push(ControllerEvent::Respawned);
    }

    /// Take everything emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_defeated(&self) -> bool {
        self.state.defeated || self.state.health <= 0.0
    }

    pub fn running_task(&self) -> Option<TaskKind> {
        self.scheduler.running()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }
}

fn decay_left_hand_combo(ctx: &mut TaskCtx) {
    let state = &mut *ctx.state;
    if state.left_hand_combo > 0
        && state.attack_state != AttackState::LeftHand
        && state.timers.combo_decay == 0
    {
        state.left_hand_combo -= 1;
        state.timers.combo_decay = ctx.tuning.melee.left_hand_combo_decay;
    }
}

fn berserk_shockwave(ctx: &mut TaskCtx) {
    let tuning = ctx.tuning;
    let cfg = &tuning.phase;
    let origin = ctx.agent_position();
    let nearby = ctx.world.actors_within(origin, cfg.shockwave_radius);
    for actor in &nearby {
        let away = horizontal_direction(origin, actor.position);
        ctx.world
            .push_actor(actor.id, away * cfg.shockwave_push + Vec3::Y * cfg.shockwave_lift);
    }
    info!("Berserk shockwave pushed {} actors", nearby.len());
    ctx.events.push(ControllerEvent::Shockwave {
        pushed: nearby.len(),
    });
}
