//! Unit tests for combat log query and aggregation methods
//!
//! These tests verify that the CombatLog correctly:
//! - Aggregates damage by ability
//! - Counts killing blows and ability uses
//! - Counts gate windows
//! - Identifies surviving combatants
//! - Exports readable JSON

use boss_controller::combat::log::{CombatLog, CombatLogEventType, StructuredEventData};
use regex::Regex;

const BOSS: &str = "Void Warden";

fn create_test_log() -> CombatLog {
    CombatLog::default()
}

fn hit(log: &mut CombatLog, source: &str, target: &str, ability: &str, amount: f32) {
    log.log_damage(
        source.to_string(),
        target.to_string(),
        ability.to_string(),
        amount,
        false,
        "Test".to_string(),
    );
}

// =============================================================================
// Damage Aggregation Tests
// =============================================================================

#[test]
fn test_damage_by_ability_empty_log() {
    let log = create_test_log();
    let damage = log.damage_by_ability(BOSS);
    assert!(damage.is_empty(), "Empty log should return empty damage map");
}

#[test]
fn test_damage_by_ability_single_source() {
    let mut log = create_test_log();

    hit(&mut log, BOSS, "Knight", "Void Beam", 6.0);
    hit(&mut log, BOSS, "Knight", "Void Beam", 6.0);
    hit(&mut log, BOSS, "Knight", "Slash", 15.0);

    let damage = log.damage_by_ability(BOSS);

    assert_eq!(damage.len(), 2, "Should have 2 different abilities");
    assert_eq!(damage.get("Void Beam"), Some(&12.0), "Beam should total 12 damage");
    assert_eq!(damage.get("Slash"), Some(&15.0));
}

#[test]
fn test_damage_by_ability_multiple_sources() {
    let mut log = create_test_log();

    hit(&mut log, BOSS, "Knight", "Slash", 15.0);
    hit(&mut log, "Knight", BOSS, "Attack", 20.0);

    assert_eq!(log.damage_by_ability(BOSS).get("Slash"), Some(&15.0));
    assert_eq!(log.damage_by_ability("Knight").get("Attack"), Some(&20.0));
    assert!(log.damage_by_ability("Knight").get("Slash").is_none());
}

#[test]
fn test_total_damage_dealt_and_taken() {
    let mut log = create_test_log();

    hit(&mut log, BOSS, "Knight", "Slash", 15.0);
    hit(&mut log, BOSS, "Archer", "Void Burst", 26.0);
    hit(&mut log, "Knight", BOSS, "Attack", 20.0);
    hit(&mut log, "Archer", BOSS, "Attack", 0.0);

    assert_eq!(log.total_damage_dealt(BOSS), 41.0);
    assert_eq!(log.total_damage_taken(BOSS), 20.0, "Rejected hits count as zero");
    assert_eq!(log.total_damage_taken("Knight"), 15.0);
}

#[test]
fn test_killing_blows() {
    let mut log = create_test_log();

    hit(&mut log, BOSS, "Knight", "Slash", 15.0);
    log.log_damage(
        BOSS.to_string(),
        "Knight".to_string(),
        "Slash".to_string(),
        5.0,
        true,
        "Knight falls".to_string(),
    );

    assert_eq!(log.killing_blows(BOSS), 1);
    assert_eq!(log.killing_blows("Knight"), 0);
}

// =============================================================================
// Ability, Gate and Survival Tests
// =============================================================================

#[test]
fn test_ability_uses() {
    let mut log = create_test_log();

    for ability in ["Void Beam", "Grab", "Void Beam"] {
        log.log_ability(BOSS.to_string(), ability.to_string(), "Test".to_string());
    }

    let uses = log.ability_uses(BOSS);
    assert_eq!(uses.get("Void Beam"), Some(&2));
    assert_eq!(uses.get("Grab"), Some(&1));
    assert!(log.ability_uses("Knight").is_empty());
}

#[test]
fn test_gate_windows_counted_from_openings_only() {
    let mut log = create_test_log();

    log.log_gate(20.0, true, 40, "Gate opens".to_string());
    log.log(CombatLogEventType::GateWindow, "Hit rejected".to_string());
    log.log(CombatLogEventType::GateWindow, "Chunk applied".to_string());
    log.log_gate(20.0, false, 30, "Gate opens".to_string());

    assert_eq!(log.gate_windows(), 2);
    assert_eq!(log.filter_by_type(CombatLogEventType::GateWindow).len(), 4);
}

#[test]
fn test_combatant_survived() {
    let mut log = create_test_log();

    log.log_death(
        "Knight".to_string(),
        Some(BOSS.to_string()),
        "Knight has been slain".to_string(),
    );

    assert!(!log.combatant_survived("Knight"));
    assert!(log.combatant_survived("Archer"));
    assert!(log.combatant_survived(BOSS));
}

#[test]
fn test_refused_heal_is_recorded() {
    let mut log = create_test_log();

    log.log_healing(BOSS.to_string(), 50.0, false, "Heal refused".to_string());

    let healing = log.filter_by_type(CombatLogEventType::Healing);
    assert_eq!(healing.len(), 1);
    assert_eq!(
        healing[0].data,
        Some(StructuredEventData::Healing {
            target: BOSS.to_string(),
            amount: 50.0,
            accepted: false
        })
    );
}

#[test]
fn test_all_combatants_no_duplicates() {
    let mut log = create_test_log();

    log.register_combatant(BOSS.to_string());
    log.register_combatant("Knight".to_string());
    log.register_combatant("Knight".to_string()); // Duplicate

    assert_eq!(log.all_combatants(), &[BOSS.to_string(), "Knight".to_string()]);
}

// =============================================================================
// Filter Tests
// =============================================================================

#[test]
fn test_filter_by_type() {
    let mut log = create_test_log();

    log.log(CombatLogEventType::MatchEvent, "Encounter started".to_string());
    hit(&mut log, BOSS, "Knight", "Slash", 15.0);
    log.log_healing(BOSS.to_string(), 10.0, true, "Test".to_string());
    log.log(CombatLogEventType::PhaseChange, "Normal to Enraged".to_string());

    assert_eq!(log.filter_by_type(CombatLogEventType::Damage).len(), 1);
    assert_eq!(log.filter_by_type(CombatLogEventType::Healing).len(), 1);
    assert_eq!(log.filter_by_type(CombatLogEventType::MatchEvent).len(), 1);
    assert_eq!(log.filter_by_type(CombatLogEventType::PhaseChange).len(), 1);
}

#[test]
fn test_hp_changes_only() {
    let mut log = create_test_log();

    log.log(CombatLogEventType::MatchEvent, "Encounter started".to_string());
    hit(&mut log, BOSS, "Knight", "Slash", 15.0);
    log.log_healing(BOSS.to_string(), 10.0, true, "Test".to_string());
    log.log_debuff("Knight".to_string(), "Wither".to_string(), 200, "Test".to_string());

    let hp_changes = log.hp_changes_only();
    assert_eq!(hp_changes.len(), 2, "Should only include damage and healing events");
}

#[test]
fn test_recent_entries() {
    let mut log = create_test_log();

    for i in 0..10 {
        log.log(CombatLogEventType::MatchEvent, format!("Event {}", i));
    }

    let recent = log.recent(3);
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].message, "Event 7");
    assert_eq!(recent[1].message, "Event 8");
    assert_eq!(recent[2].message, "Event 9");
}

#[test]
fn test_entries_stamped_with_tick() {
    let mut log = create_test_log();

    log.tick = 12;
    log.log(CombatLogEventType::MatchEvent, "First".to_string());
    log.tick = 40;
    hit(&mut log, BOSS, "Knight", "Slash", 15.0);

    assert_eq!(log.entries[0].tick, 12);
    assert_eq!(log.entries[1].tick, 40);

    log.clear();
    assert!(log.entries.is_empty());
    assert_eq!(log.tick, 0);
}

// =============================================================================
// Export Tests
// =============================================================================

#[test]
fn test_save_to_file_writes_json() {
    let mut log = create_test_log();
    log.register_combatant(BOSS.to_string());
    log.tick = 7;
    log.log_gate(20.0, true, 40, "Gate opens".to_string());
    hit(&mut log, "Knight", BOSS, "Attack", 20.0);

    let path = std::env::temp_dir().join(format!("boss_log_{}.json", std::process::id()));
    log.save_to_file(&path).expect("log should save");
    let contents = std::fs::read_to_string(&path).expect("log should be readable");
    std::fs::remove_file(&path).ok();

    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(json["ticks"], 7);
    assert_eq!(json["combatants"][0], BOSS);
    assert_eq!(json["entries"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["entries"][0]["data"]["kind"], "Gate");
    assert_eq!(json["entries"][1]["event_type"], "Damage");

    let tick_field = Regex::new(r#""tick":\s*7"#).unwrap();
    assert_eq!(tick_field.find_iter(&contents).count(), 2);
}

#[test]
fn test_plain_entries_omit_data() {
    let mut log = create_test_log();
    log.log(CombatLogEventType::MatchEvent, "Encounter started".to_string());

    let path = std::env::temp_dir().join(format!("boss_plain_log_{}.json", std::process::id()));
    log.save_to_file(&path).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!(!contents.contains("\"data\""));
}
