//! Integration tests for headless match execution
//!
//! These tests verify that:
//! - Headless matches run to completion
//! - Match results are accessible programmatically
//! - Seeded RNG produces deterministic results

use std::path::Path;

use boss_controller::combat::log::{CombatLog, CombatLogEventType};
use boss_controller::controller::tuning::ConfigError;
use boss_controller::headless::{
    build_headless_app, simulate_match, ChallengerConfig, HeadlessMatchConfig, HeadlessMatchState,
    MatchOutcome,
};

/// Helper to create a basic match config
fn create_config(challengers: Vec<ChallengerConfig>, seed: Option<u64>) -> HeadlessMatchConfig {
    HeadlessMatchConfig {
        challengers,
        max_ticks: 2000,
        random_seed: seed,
        output_path: None,
        tuning_path: None,
        arena_half_extent: 30.0,
        pillars: vec![],
    }
}

fn challenger(name: &str, spawn: [f32; 3]) -> ChallengerConfig {
    let mut config = ChallengerConfig::named(name);
    config.spawn = Some(spawn);
    config
}

/// Heavy hitter standing next to the boss, attacking every step
fn bruiser(name: &str) -> ChallengerConfig {
    let mut config = challenger(name, [1.5, 0.0, 0.0]);
    config.health = 10_000.0;
    config.attack_damage = 50.0;
    config.attack_interval = 1;
    config
}

// =============================================================================
// Outcome Tests
// =============================================================================

#[test]
fn test_match_times_out() {
    let mut config = create_config(vec![ChallengerConfig::named("Knight")], Some(1));
    config.max_ticks = 5;

    let result = simulate_match(config).unwrap();
    assert_eq!(result.outcome, MatchOutcome::Timeout);
    assert_eq!(result.ticks, 5);
    assert_eq!(result.boss_final_health, 200.0);
    assert_eq!(result.random_seed, Some(1));
}

#[test]
fn test_gate_paces_a_relentless_attacker() {
    let config = create_config(vec![bruiser("Bruiser")], Some(7));

    let result = simulate_match(config).unwrap();
    assert_eq!(result.outcome, MatchOutcome::BossDefeated);
    assert_eq!(result.boss_final_health, 0.0);
    assert!(
        result.gate_windows <= 5,
        "Every window costs at least 50 health or counts towards the cap"
    );
    assert!(
        result.ticks >= 3 * 40,
        "A hit every step still waits out each window, took {}",
        result.ticks
    );
    assert!(result.challengers[0].survived);
    assert!(result.challengers[0].damage_dealt > 0.0);
}

#[test]
fn test_boss_defeats_fragile_challenger() {
    let mut config = ChallengerConfig::named("Squire");
    config.spawn = Some([2.5, 0.0, 0.0]);
    config.health = 1.0;
    config.attack_damage = 0.0;

    let result = simulate_match(create_config(vec![config], Some(3))).unwrap();
    assert_eq!(result.outcome, MatchOutcome::ChallengersDefeated);
    assert_eq!(result.boss_final_health, 200.0);
    assert!(!result.challengers[0].survived);
    assert_eq!(result.challengers[0].final_health, 0.0);
    assert_eq!(result.boss_phase, "Normal");
}

// =============================================================================
// Determinism Tests
// =============================================================================

#[test]
fn test_same_seed_same_match() {
    let run = || {
        let mut config = create_config(
            vec![
                challenger("Knight", [0.0, 0.0, 10.0]),
                challenger("Archer", [-10.0, 0.0, 0.0]),
            ],
            Some(42),
        );
        config.max_ticks = 600;
        simulate_match(config).unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first.ticks, second.ticks);
    assert_eq!(first.boss_final_health, second.boss_final_health);
    assert_eq!(first.gate_windows, second.gate_windows);
    for (a, b) in first.challengers.iter().zip(&second.challengers) {
        assert_eq!(a.final_health, b.final_health);
        assert_eq!(a.damage_taken, b.damage_taken);
    }
}

// =============================================================================
// App and Config Tests
// =============================================================================

#[test]
fn test_app_records_start_of_encounter() {
    let config = create_config(vec![ChallengerConfig::named("Knight")], Some(9));
    let mut app = build_headless_app(config).unwrap();
    app.finish();
    app.cleanup();

    for _ in 0..3 {
        app.update();
    }

    let state = app.world().resource::<HeadlessMatchState>();
    assert_eq!(state.ticks, 3);
    assert!(!state.match_complete);

    let log = app.world().resource::<CombatLog>();
    let events = log.filter_by_type(CombatLogEventType::MatchEvent);
    assert!(events[0].message.contains("Encounter started"));
    assert!(log.all_combatants().contains(&"Knight".to_string()));
}

#[test]
fn test_output_path_receives_log() {
    let path = std::env::temp_dir().join(format!("boss_match_{}.json", std::process::id()));
    let mut config = create_config(vec![ChallengerConfig::named("Knight")], Some(2));
    config.max_ticks = 20;
    config.output_path = Some(path.to_string_lossy().into_owned());

    simulate_match(config).unwrap();
    let contents = std::fs::read_to_string(&path).expect("match log should be written");
    std::fs::remove_file(&path).ok();

    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(json["ticks"], 20);
}

#[test]
fn test_invalid_config_rejected() {
    let config = create_config(vec![], None);
    assert!(matches!(
        simulate_match(config),
        Err(ConfigError::Invalid(_))
    ));

    let mut config = create_config(vec![ChallengerConfig::named("Knight")], None);
    config.tuning_path = Some("does/not/exist.ron".to_string());
    assert!(simulate_match(config).is_err());
}

#[test]
fn test_demo_configs_load() {
    let duo = HeadlessMatchConfig::load_from_file(Path::new("demos/duo.json")).unwrap();
    assert_eq!(duo.challengers.len(), 2);
    assert!(duo.load_tuning().is_ok());

    let raid = HeadlessMatchConfig::load_from_file(Path::new("demos/raid.json")).unwrap();
    assert_eq!(raid.pillars.len(), 2);
    assert!(raid.challengers.iter().any(|c| c.guards));
}
