//! Headless match execution
//!
//! Runs a boss encounter without any graphical output, suitable for automated
//! testing and tuning sweeps.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use serde::Serialize;
use std::path::Path;

use crate::combat::events::{BossHitEvent, ControllerEvent, DamageDealtEvent, DebuffAppliedEvent};
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::combat::{record_combat_log, CombatPlugin, CombatantNames, BOSS_NAME};
use crate::controller::gate::DamageSource;
use crate::controller::rng::GameRng;
use crate::controller::tuning::{BossTuning, ConfigError};
use crate::controller::BossController;

use super::arena::Arena;
use super::config::HeadlessMatchConfig;

/// How the encounter ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOutcome {
    BossDefeated,
    ChallengersDefeated,
    Timeout,
}

/// Result of a completed headless match
///
/// This struct provides programmatic access to match results for testing and analysis.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub outcome: MatchOutcome,
    /// Steps simulated
    pub ticks: u64,
    pub boss_final_health: f32,
    pub boss_max_health: f32,
    /// Phase name at match end
    pub boss_phase: String,
    /// Gate windows opened during the match
    pub gate_windows: usize,
    /// Challenger statistics from the match
    pub challengers: Vec<ChallengerResult>,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
}

/// Statistics for a single challenger after the match
#[derive(Debug, Clone, Serialize)]
pub struct ChallengerResult {
    pub name: String,
    pub max_health: f32,
    /// Health remaining at match end (0 if dead)
    pub final_health: f32,
    pub survived: bool,
    /// Health actually removed from the boss
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

/// Resource to track headless match state
#[derive(Resource)]
pub struct HeadlessMatchState {
    /// Maximum match length before declaring a timeout
    pub max_ticks: u64,
    /// Steps simulated so far
    pub ticks: u64,
    /// Custom output path for match log
    pub output_path: Option<String>,
    /// Whether the match has completed
    pub match_complete: bool,
    /// Random seed for deterministic simulation (if provided)
    pub random_seed: Option<u64>,
    /// Match result (populated when match completes)
    pub result: Option<MatchResult>,
}

/// Plugin for headless match execution
pub struct HeadlessPlugin {
    pub config: HeadlessMatchConfig,
    pub tuning: BossTuning,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<CombatPlugin>() {
            app.add_plugins(CombatPlugin);
        }

        let rng = match self.config.random_seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                GameRng::from_seed(seed)
            }
            None => {
                info!("Using non-deterministic RNG (no seed provided)");
                GameRng::from_entropy()
            }
        };

        app.insert_resource(Arena::from_config(&self.config))
            .insert_resource(HeadlessMatchState {
                max_ticks: self.config.max_ticks,
                ticks: 0,
                output_path: self.config.output_path.clone(),
                match_complete: false,
                random_seed: self.config.random_seed,
                result: None,
            })
            .insert_resource(BossSpawn {
                tuning: self.tuning.clone(),
                rng: Some(rng),
            })
            .add_systems(Startup, headless_setup_match)
            .add_systems(
                Update,
                (
                    headless_track_ticks,
                    challenger_actions,
                    step_boss,
                    integrate_motion,
                    record_combat_log,
                    headless_check_match_end,
                )
                    .chain(),
            )
            .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

/// Ingredients for the boss entity, consumed at startup
#[derive(Resource)]
struct BossSpawn {
    tuning: BossTuning,
    rng: Option<GameRng>,
}

/// Setup system for headless match
fn headless_setup_match(
    mut commands: Commands,
    mut spawn: ResMut<BossSpawn>,
    arena: Res<Arena>,
    mut names: ResMut<CombatantNames>,
    mut combat_log: ResMut<CombatLog>,
) {
    combat_log.clear();
    combat_log.log(
        CombatLogEventType::MatchEvent,
        "Encounter started (headless mode)!".to_string(),
    );

    let rng = spawn.rng.take().unwrap_or_default();
    commands.spawn(BossController::new(spawn.tuning.clone(), rng));
    combat_log.register_combatant(BOSS_NAME.to_string());

    for challenger in &arena.challengers {
        names.insert(challenger.id, challenger.name.clone());
        combat_log.register_combatant(challenger.name.clone());
    }

    info!(
        "Headless match setup complete: {} vs {} challengers",
        BOSS_NAME,
        arena.challengers.len()
    );
}

/// Advance the step counter; the log stamps entries with it
fn headless_track_ticks(
    mut headless_state: ResMut<HeadlessMatchState>,
    mut combat_log: ResMut<CombatLog>,
) {
    if headless_state.match_complete {
        return;
    }
    headless_state.ticks += 1;
    combat_log.tick = headless_state.ticks;
}

/// Challengers move and attack; their hits go straight through the gate
fn challenger_actions(
    headless_state: Res<HeadlessMatchState>,
    mut arena: ResMut<Arena>,
    mut bosses: Query<&mut BossController>,
    mut hit_events: EventWriter<BossHitEvent>,
) {
    if headless_state.match_complete {
        return;
    }
    arena.tick_effects(headless_state.ticks);

    let Ok(mut boss) = bosses.get_single_mut() else {
        return;
    };
    for (attacker, amount) in arena.challenger_turns() {
        let before = boss.state().health;
        boss.on_incoming_damage(amount, DamageSource::Attacker(attacker));
        let health_lost = (before - boss.state().health).max(0.0);
        if let Some(challenger) = arena.challenger_mut(attacker) {
            challenger.damage_dealt += health_lost;
        }
        hit_events.send(BossHitEvent {
            attacker,
            amount,
            health_lost,
        });
    }
}

/// Run one controller step against the arena and publish what happened
fn step_boss(
    headless_state: Res<HeadlessMatchState>,
    mut arena: ResMut<Arena>,
    mut bosses: Query<&mut BossController>,
    mut controller_events: EventWriter<ControllerEvent>,
    mut damage_events: EventWriter<DamageDealtEvent>,
    mut debuff_events: EventWriter<DebuffAppliedEvent>,
) {
    if headless_state.match_complete {
        return;
    }
    for mut boss in bosses.iter_mut() {
        boss.step(&mut *arena);
        controller_events.send_batch(boss.drain_events());
    }

    let (damage, debuffs) = arena.drain_events();
    damage_events.send_batch(damage);
    debuff_events.send_batch(debuffs);
}

fn integrate_motion(headless_state: Res<HeadlessMatchState>, mut arena: ResMut<Arena>) {
    if headless_state.match_complete {
        return;
    }
    arena.integrate();
}

/// Check if the match has ended (boss or every challenger down, or timeout)
fn headless_check_match_end(
    arena: Res<Arena>,
    bosses: Query<&BossController>,
    combat_log: Res<CombatLog>,
    mut headless_state: ResMut<HeadlessMatchState>,
) {
    if headless_state.match_complete {
        return;
    }
    let Ok(boss) = bosses.get_single() else {
        return;
    };

    let outcome = if boss.is_defeated() {
        info!("Match ended! {} defeated", BOSS_NAME);
        MatchOutcome::BossDefeated
    } else if !arena.any_alive() {
        info!("Match ended! {} wins", BOSS_NAME);
        MatchOutcome::ChallengersDefeated
    } else if headless_state.ticks >= headless_state.max_ticks {
        info!(
            "Match timed out after {} ticks",
            headless_state.ticks
        );
        MatchOutcome::Timeout
    } else {
        return;
    };

    let result = build_match_result(outcome, boss, &arena, &combat_log, &headless_state);
    if let Some(path) = headless_state.output_path.as_deref() {
        if let Err(e) = combat_log.save_to_file(Path::new(path)) {
            warn!("Failed to save combat log: {}", e);
        }
    }
    headless_state.result = Some(result);
    headless_state.match_complete = true;
}

/// Build the MatchResult from the final arena and boss state
fn build_match_result(
    outcome: MatchOutcome,
    boss: &BossController,
    arena: &Arena,
    combat_log: &CombatLog,
    headless_state: &HeadlessMatchState,
) -> MatchResult {
    let state = boss.state();
    MatchResult {
        outcome,
        ticks: headless_state.ticks,
        boss_final_health: state.health,
        boss_max_health: state.max_health,
        boss_phase: state.phase.name().to_string(),
        gate_windows: combat_log.gate_windows(),
        challengers: arena
            .challengers
            .iter()
            .map(|c| ChallengerResult {
                name: c.name.clone(),
                max_health: c.max_health,
                final_health: c.health.max(0.0),
                survived: c.is_alive(),
                damage_dealt: c.damage_dealt,
                damage_taken: c.damage_taken,
            })
            .collect(),
        random_seed: headless_state.random_seed,
    }
}

/// Exit the app when the match is complete
fn headless_exit_on_complete(
    headless_state: Res<HeadlessMatchState>,
    mut exit: EventWriter<AppExit>,
) {
    if headless_state.match_complete {
        exit.send(AppExit::Success);
    }
}

/// Build the headless app without running it
pub fn build_headless_app(config: HeadlessMatchConfig) -> Result<App, ConfigError> {
    headless_app(config, false)
}

fn headless_app(config: HeadlessMatchConfig, logging: bool) -> Result<App, ConfigError> {
    config.validate()?;
    let tuning = config.load_tuning()?;

    let mut app = App::new();
    if logging {
        app.add_plugins(LogPlugin::default());
    }
    // Minimal plugins - no window, no rendering
    app.add_plugins(MinimalPlugins)
        .add_plugins(HeadlessPlugin { config, tuning });
    Ok(app)
}

/// Step an app built by [`build_headless_app`] until the match ends
pub fn run_to_completion(mut app: App) -> MatchResult {
    app.finish();
    app.cleanup();

    loop {
        app.update();
        let state = app.world().resource::<HeadlessMatchState>();
        if let Some(result) = &state.result {
            return result.clone();
        }
    }
}

/// Run a match to completion and return its result
pub fn simulate_match(config: HeadlessMatchConfig) -> Result<MatchResult, ConfigError> {
    Ok(run_to_completion(build_headless_app(config)?))
}

/// Run a headless match with the given configuration, printing a summary
pub fn run_headless_match(config: HeadlessMatchConfig) -> Result<MatchResult, ConfigError> {
    println!("Starting headless boss encounter...");
    for challenger in &config.challengers {
        println!(
            "  {}: {:.0} hp, {:.0} dmg every {} ticks{}",
            challenger.name,
            challenger.health,
            challenger.attack_damage,
            challenger.attack_interval,
            if challenger.guards { ", guarding" } else { "" }
        );
    }
    println!("  Max ticks: {}", config.max_ticks);

    let result = run_to_completion(headless_app(config, true)?);

    println!(
        "Match complete after {} ticks: {:?}",
        result.ticks, result.outcome
    );
    println!(
        "  {}: {:.0}/{:.0} hp ({} phase), {} gate windows",
        BOSS_NAME,
        result.boss_final_health,
        result.boss_max_health,
        result.boss_phase,
        result.gate_windows
    );
    for challenger in &result.challengers {
        println!(
            "  {}: {:.0}/{:.0} hp, dealt {:.0}, took {:.0}",
            challenger.name,
            challenger.final_health,
            challenger.max_health,
            challenger.damage_dealt,
            challenger.damage_taken
        );
    }
    Ok(result)
}
