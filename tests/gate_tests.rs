//! Integration tests for the damage gate, driven through the controller
//!
//! These tests verify that:
//! - An opening hit costs exactly the fixed amount and pins health
//! - Hits during a window are rejected and never extend it
//! - The delayed chunk lands exactly once, when the window closes
//! - The consecutive-hit cap forces defeat
//! - Heals are refused while the window is open

use boss_controller::combat::events::ControllerEvent;
use boss_controller::controller::gate::{DamageOutcome, DamageSource};
use boss_controller::controller::rng::GameRng;
use boss_controller::controller::state::Phase;
use boss_controller::controller::tuning::BossTuning;
use boss_controller::controller::world::EntityRef;
use boss_controller::controller::BossController;
use boss_controller::headless::Arena;

const ATTACKER: DamageSource = DamageSource::Attacker(EntityRef(1));

/// Helper to create a controller in an empty arena
fn setup(tuning: BossTuning) -> (BossController, Arena) {
    (
        BossController::new(tuning, GameRng::from_seed(7)),
        Arena::new(30.0),
    )
}

fn run(boss: &mut BossController, arena: &mut Arena, steps: u32) {
    for _ in 0..steps {
        boss.step(arena);
    }
}

fn count_chunks(events: &[ControllerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ControllerEvent::ChunkApplied { .. }))
        .count()
}

// =============================================================================
// Window Tests
// =============================================================================

#[test]
fn test_window_pins_health_and_releases_chunk_once() {
    let (mut boss, mut arena) = setup(BossTuning::default());

    let outcome = boss.on_incoming_damage(45.0, ATTACKER);
    assert_eq!(
        outcome,
        DamageOutcome::Gated {
            taken: 20.0,
            chunk_pending: true
        }
    );
    assert_eq!(boss.state().health, 180.0);
    assert!(boss.view().is_invulnerable);

    run(&mut boss, &mut arena, 39);
    assert_eq!(boss.state().health, 180.0, "Health stays pinned during the window");
    assert!(boss.view().is_invulnerable);

    run(&mut boss, &mut arena, 1);
    assert_eq!(boss.state().health, 150.0, "Chunk lands when the window closes");
    assert!(!boss.view().is_invulnerable);

    run(&mut boss, &mut arena, 100);
    assert_eq!(boss.state().health, 150.0, "Chunk is applied only once");
    assert_eq!(count_chunks(&boss.drain_events()), 1);
}

#[test]
fn test_small_hit_costs_fixed_amount_without_chunk() {
    let (mut boss, mut arena) = setup(BossTuning::default());

    boss.on_incoming_damage(10.0, ATTACKER);
    assert_eq!(boss.state().health, 180.0, "Small hits still cost the fixed amount");

    run(&mut boss, &mut arena, 60);
    assert_eq!(boss.state().health, 180.0);
    assert_eq!(count_chunks(&boss.drain_events()), 0);
}

#[test]
fn test_hits_during_window_are_rejected_without_extension() {
    let (mut boss, mut arena) = setup(BossTuning::default());

    boss.on_incoming_damage(45.0, ATTACKER);
    run(&mut boss, &mut arena, 20);

    for _ in 0..10 {
        assert_eq!(boss.on_incoming_damage(999.0, ATTACKER), DamageOutcome::Rejected);
    }
    assert_eq!(boss.state().gate.invulnerable_ticks, 20);

    run(&mut boss, &mut arena, 20);
    assert!(!boss.view().is_invulnerable, "Rejected hits never extend the window");
    assert_eq!(boss.state().health, 150.0);
}

#[test]
fn test_queued_hits_resolve_in_arrival_order() {
    let (mut boss, mut arena) = setup(BossTuning::default());

    boss.queue_damage(45.0, ATTACKER);
    boss.queue_damage(45.0, DamageSource::Attacker(EntityRef(2)));
    assert_eq!(boss.state().health, 200.0, "Queued hits wait for the step");

    boss.step(&mut arena);
    assert_eq!(boss.state().health, 180.0, "Second queued hit meets an open gate");

    let events = boss.drain_events();
    let opened = events
        .iter()
        .position(|e| matches!(e, ControllerEvent::GateOpened { .. }));
    let rejected = events
        .iter()
        .position(|e| matches!(e, ControllerEvent::GateRejected { .. }));
    assert!(opened.is_some() && rejected.is_some());
    assert!(opened < rejected);
}

#[test]
fn test_external_health_write_is_corrected() {
    let (mut boss, mut arena) = setup(BossTuning::default());

    boss.on_incoming_damage(45.0, ATTACKER);
    boss.state_mut().health = 500.0;
    boss.step(&mut arena);
    assert_eq!(boss.state().health, 180.0, "Pinned value wins while the gate is open");

    run(&mut boss, &mut arena, 60);
    boss.state_mut().health = 500.0;
    boss.step(&mut arena);
    assert_eq!(boss.state().health, 200.0, "Health is clamped to max");
}

#[test]
fn test_trusted_sources_bypass_open_gate() {
    let (mut boss, _arena) = setup(BossTuning::default());

    boss.on_incoming_damage(45.0, ATTACKER);
    let outcome = boss.on_incoming_damage(25.0, DamageSource::Exempt);
    assert_eq!(outcome, DamageOutcome::Applied { amount: 25.0 });
    assert_eq!(boss.state().health, 155.0);
}

#[test]
fn test_shield_absorbs_fixed_amount_first() {
    let (mut boss, _arena) = setup(BossTuning::default());
    boss.state_mut().shield = 12.0;

    boss.on_incoming_damage(45.0, ATTACKER);
    assert_eq!(boss.state().shield, 0.0);
    assert_eq!(boss.state().health, 192.0);
}

#[test]
fn test_berserk_window_is_shorter() {
    let (mut boss, mut arena) = setup(BossTuning::default());
    boss.state_mut().health = 50.0;
    boss.step(&mut arena);
    assert_eq!(boss.state().phase, Phase::Berserk);

    boss.on_incoming_damage(45.0, ATTACKER);
    assert_eq!(boss.state().gate.invulnerable_ticks, 30);
}

// =============================================================================
// Hit Cap Tests
// =============================================================================

#[test]
fn test_hit_cap_forces_defeat() {
    let mut tuning = BossTuning::default();
    tuning.stats.max_health = 1000.0;
    let (mut boss, mut arena) = setup(tuning);

    for hit in 1..5 {
        let outcome = boss.on_incoming_damage(45.0, ATTACKER);
        assert!(
            matches!(outcome, DamageOutcome::Gated { .. }),
            "Hit {} should open the gate",
            hit
        );
        run(&mut boss, &mut arena, 40);
    }
    assert_eq!(boss.state().health, 800.0);

    assert_eq!(boss.on_incoming_damage(45.0, ATTACKER), DamageOutcome::Lethal);
    assert_eq!(boss.state().health, 0.0);

    boss.step(&mut arena);
    assert!(boss.is_defeated());
    let events = boss.drain_events();
    assert!(events.contains(&ControllerEvent::HitCapReached { hits: 5 }));
    assert!(events.contains(&ControllerEvent::Defeated));
}

#[test]
fn test_small_opener_resets_hit_counter() {
    let mut tuning = BossTuning::default();
    tuning.stats.max_health = 1000.0;
    let (mut boss, mut arena) = setup(tuning);

    for _ in 0..4 {
        boss.on_incoming_damage(45.0, ATTACKER);
        run(&mut boss, &mut arena, 40);
    }
    boss.on_incoming_damage(5.0, ATTACKER);
    run(&mut boss, &mut arena, 40);

    let outcome = boss.on_incoming_damage(45.0, ATTACKER);
    assert!(matches!(outcome, DamageOutcome::Gated { .. }));
    assert!(!boss.is_defeated());
}

// =============================================================================
// Lethal and Heal Tests
// =============================================================================

#[test]
fn test_lethal_hit_leaves_no_window() {
    let (mut boss, mut arena) = setup(BossTuning::default());
    boss.state_mut().health = 15.0;

    assert_eq!(boss.on_incoming_damage(45.0, ATTACKER), DamageOutcome::Lethal);
    assert!(!boss.view().is_invulnerable);

    boss.step(&mut arena);
    assert!(boss.view().defeated);
    assert_eq!(
        boss.on_incoming_damage(45.0, ATTACKER),
        DamageOutcome::Ignored,
        "Nothing lands after defeat"
    );
}

#[test]
fn test_heal_refused_while_open() {
    let (mut boss, mut arena) = setup(BossTuning::default());

    boss.on_incoming_damage(45.0, ATTACKER);
    assert!(!boss.on_heal(50.0));
    assert_eq!(boss.state().health, 180.0);
    assert!(boss
        .drain_events()
        .contains(&ControllerEvent::HealRejected { amount: 50.0 }));

    run(&mut boss, &mut arena, 40);
    assert!(boss.on_heal(500.0));
    assert_eq!(boss.state().health, 200.0, "Heals clamp to max health");
}
