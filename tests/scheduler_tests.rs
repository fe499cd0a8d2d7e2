//! Integration tests for task arbitration
//!
//! Probe tasks record every call so the tests can assert on exact ordering:
//! - Evaluation follows priority, ties follow registration order
//! - Preemption needs strictly higher priority and overlapping mutex bits
//! - The old task's stop always lands before the new task's start
//! - A task started this step is ticked this step

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use boss_controller::combat::events::ControllerEvent;
use boss_controller::controller::rng::GameRng;
use boss_controller::controller::scheduler::{BossTask, MutexBits, TaskCtx, TaskKind, TaskScheduler};
use boss_controller::controller::state::{AgentState, AttackState};
use boss_controller::controller::tuning::BossTuning;
use boss_controller::headless::Arena;

type CallLog = Arc<Mutex<Vec<String>>>;

/// Task that records its calls and runs for a fixed number of ticks
struct Probe {
    kind: TaskKind,
    log: CallLog,
    wants: Arc<AtomicBool>,
    runs_for: u32,
    remaining: u32,
    claims: Option<AttackState>,
}

impl Probe {
    fn new(kind: TaskKind, log: &CallLog, wants: bool, runs_for: u32) -> (Self, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(wants));
        let probe = Self {
            kind,
            log: log.clone(),
            wants: flag.clone(),
            runs_for,
            remaining: 0,
            claims: None,
        };
        (probe, flag)
    }

    fn record(&self, call: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{} {}", call, self.kind.name()));
    }
}

impl BossTask for Probe {
    fn kind(&self) -> TaskKind {
        self.kind
    }

    fn claims(&self) -> Option<AttackState> {
        self.claims
    }

    fn should_start(&mut self, _ctx: &mut TaskCtx) -> bool {
        self.wants.load(Ordering::SeqCst)
    }

    fn start(&mut self, _ctx: &mut TaskCtx) {
        self.record("start");
        self.remaining = self.runs_for;
    }

    fn tick(&mut self, _ctx: &mut TaskCtx) {
        self.record("tick");
        self.remaining = self.remaining.saturating_sub(1);
    }

    fn should_continue(&mut self, _ctx: &mut TaskCtx) -> bool {
        self.remaining > 0
    }

    fn stop(&mut self, _ctx: &mut TaskCtx) {
        self.record("stop");
        self.remaining = 0;
    }
}

/// Everything a [`TaskCtx`] borrows, owned by the test
struct Harness {
    state: AgentState,
    tuning: BossTuning,
    arena: Arena,
    rng: GameRng,
    events: Vec<ControllerEvent>,
}

impl Harness {
    fn new() -> Self {
        let tuning = BossTuning::default();
        Self {
            state: AgentState::new(&tuning),
            tuning,
            arena: Arena::new(30.0),
            rng: GameRng::from_seed(3),
            events: Vec::new(),
        }
    }

    fn step(&mut self, scheduler: &mut TaskScheduler) {
        let mut ctx = TaskCtx {
            state: &mut self.state,
            tuning: &self.tuning,
            world: &mut self.arena,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        scheduler.step(&mut ctx);
    }
}

fn take(log: &CallLog) -> Vec<String> {
    std::mem::take(&mut *log.lock().unwrap())
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_registration_sorts_by_priority() {
    let log = CallLog::default();
    let mut scheduler = TaskScheduler::new();
    scheduler.register(50, MutexBits::MOVE, Box::new(Probe::new(TaskKind::Chase, &log, false, 1).0));
    scheduler.register(10, MutexBits::ATTACK, Box::new(Probe::new(TaskKind::Beam, &log, false, 1).0));
    scheduler.register(30, MutexBits::ATTACK, Box::new(Probe::new(TaskKind::Slash, &log, false, 1).0));

    assert_eq!(
        scheduler.order(),
        vec![
            (10, TaskKind::Beam),
            (30, TaskKind::Slash),
            (50, TaskKind::Chase)
        ]
    );
}

#[test]
fn test_equal_priority_resolves_by_registration_order() {
    let log = CallLog::default();
    let mut scheduler = TaskScheduler::new();
    scheduler.register(20, MutexBits::ATTACK, Box::new(Probe::new(TaskKind::Slash, &log, true, 5).0));
    scheduler.register(20, MutexBits::ATTACK, Box::new(Probe::new(TaskKind::DualSlam, &log, true, 5).0));

    let mut harness = Harness::new();
    harness.step(&mut scheduler);
    assert_eq!(scheduler.running(), Some(TaskKind::Slash));
}

#[test]
fn test_started_task_is_ticked_same_step() {
    let log = CallLog::default();
    let mut scheduler = TaskScheduler::new();
    scheduler.register(50, MutexBits::MOVE, Box::new(Probe::new(TaskKind::Chase, &log, true, 3).0));

    let mut harness = Harness::new();
    harness.step(&mut scheduler);
    assert_eq!(take(&log), vec!["start Chase", "tick Chase"]);
    assert_eq!(
        harness.events,
        vec![ControllerEvent::TaskStarted { task: TaskKind::Chase }]
    );
}

// =============================================================================
// Preemption Tests
// =============================================================================

#[test]
fn test_overlapping_higher_priority_preempts() {
    let log = CallLog::default();
    let mut scheduler = TaskScheduler::new();
    let (beam, beam_wants) = Probe::new(TaskKind::Beam, &log, false, 5);
    scheduler.register(10, MutexBits::ATTACK, Box::new(beam));
    scheduler.register(50, MutexBits::MOVE, Box::new(Probe::new(TaskKind::Chase, &log, true, 100).0));

    let mut harness = Harness::new();
    harness.step(&mut scheduler);
    assert_eq!(scheduler.running(), Some(TaskKind::Chase));
    take(&log);

    beam_wants.store(true, Ordering::SeqCst);
    harness.step(&mut scheduler);
    assert_eq!(scheduler.running(), Some(TaskKind::Beam));
    assert_eq!(take(&log), vec!["stop Chase", "start Beam", "tick Beam"]);

    let stopped = harness
        .events
        .iter()
        .position(|e| *e == ControllerEvent::TaskStopped { task: TaskKind::Chase });
    let started = harness
        .events
        .iter()
        .position(|e| *e == ControllerEvent::TaskStarted { task: TaskKind::Beam });
    assert!(stopped.is_some() && started.is_some());
    assert!(stopped < started, "Stop must complete before start");
}

#[test]
fn test_disjoint_higher_priority_waits_for_finish() {
    let log = CallLog::default();
    let mut scheduler = TaskScheduler::new();
    let (look, look_wants) = Probe::new(TaskKind::Burst, &log, false, 5);
    scheduler.register(10, MutexBits::LOOK, Box::new(look));
    scheduler.register(50, MutexBits::MOVE, Box::new(Probe::new(TaskKind::Wander, &log, true, 3).0));

    let mut harness = Harness::new();
    harness.step(&mut scheduler);
    look_wants.store(true, Ordering::SeqCst);

    harness.step(&mut scheduler);
    harness.step(&mut scheduler);
    assert_eq!(scheduler.running(), Some(TaskKind::Wander), "No overlap, no preemption");
    take(&log);

    // Wander has used its three ticks; it stops and Burst starts in one step
    harness.step(&mut scheduler);
    assert_eq!(scheduler.running(), Some(TaskKind::Burst));
    assert_eq!(take(&log), vec!["stop Wander", "start Burst", "tick Burst"]);
}

#[test]
fn test_lower_priority_never_preempts() {
    let log = CallLog::default();
    let mut scheduler = TaskScheduler::new();
    let (chase, chase_wants) = Probe::new(TaskKind::Chase, &log, false, 100);
    scheduler.register(10, MutexBits::ATTACK, Box::new(Probe::new(TaskKind::Grab, &log, true, 10).0));
    scheduler.register(50, MutexBits::MOVE, Box::new(chase));

    let mut harness = Harness::new();
    harness.step(&mut scheduler);
    chase_wants.store(true, Ordering::SeqCst);
    for _ in 0..5 {
        harness.step(&mut scheduler);
        assert_eq!(scheduler.running(), Some(TaskKind::Grab));
    }
}

#[test]
fn test_register_while_running_keeps_running_task() {
    let log = CallLog::default();
    let mut scheduler = TaskScheduler::new();
    scheduler.register(50, MutexBits::MOVE, Box::new(Probe::new(TaskKind::Chase, &log, true, 100).0));

    let mut harness = Harness::new();
    harness.step(&mut scheduler);
    scheduler.register(5, MutexBits::LOOK, Box::new(Probe::new(TaskKind::Beam, &log, false, 1).0));

    assert_eq!(scheduler.running(), Some(TaskKind::Chase));
    assert_eq!(scheduler.running_mutex(), MutexBits::MOVE);
}

#[test]
fn test_stop_running_leaves_scheduler_idle() {
    let log = CallLog::default();
    let mut scheduler = TaskScheduler::new();
    scheduler.register(50, MutexBits::MOVE, Box::new(Probe::new(TaskKind::Chase, &log, true, 100).0));

    let mut harness = Harness::new();
    harness.step(&mut scheduler);
    take(&log);

    let mut ctx = TaskCtx {
        state: &mut harness.state,
        tuning: &harness.tuning,
        world: &mut harness.arena,
        rng: &mut harness.rng,
        events: &mut harness.events,
    };
    scheduler.stop_running(&mut ctx);
    assert_eq!(scheduler.running(), None);
    assert_eq!(take(&log), vec!["stop Chase"]);
}

// =============================================================================
// Restored Channel Tests
// =============================================================================

#[test]
fn test_restored_attack_state_is_adopted_by_owner() {
    let log = CallLog::default();
    let mut scheduler = TaskScheduler::new();
    let (mut beam, _) = Probe::new(TaskKind::Beam, &log, false, 5);
    beam.claims = Some(AttackState::Beam);
    beam.remaining = 5;
    scheduler.register(10, MutexBits::ATTACK, Box::new(beam));

    let mut harness = Harness::new();
    harness.state.attack_state = AttackState::Beam;
    harness.step(&mut scheduler);

    assert_eq!(scheduler.running(), Some(TaskKind::Beam));
    assert_eq!(take(&log), vec!["tick Beam"], "Adopted without a fresh start");
}

#[test]
fn test_unowned_attack_state_returns_to_idle() {
    let log = CallLog::default();
    let mut scheduler = TaskScheduler::new();
    scheduler.register(50, MutexBits::MOVE, Box::new(Probe::new(TaskKind::Chase, &log, false, 5).0));

    let mut harness = Harness::new();
    harness.state.attack_state = AttackState::Grab;
    harness.step(&mut scheduler);

    assert_eq!(harness.state.attack_state, AttackState::Idle);
    assert_eq!(scheduler.running(), None);
}
