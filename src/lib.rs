//! Boss Controller - step-driven behavior controller for a hostile boss
//!
//! The controller arbitrates a prioritized set of attack and movement
//! behaviors, gates incoming damage into fixed chunks, and escalates through
//! health-driven phases. It talks to its surroundings only through the
//! [`controller::world`] traits, so it can run inside a game engine adapter
//! or the bundled headless arena.
//!
//! This library exposes the controller and the headless sandbox for testing
//! and reuse.

pub mod cli;
pub mod combat;
pub mod controller;
pub mod headless;

// Re-export commonly used types
pub use combat::log::{CombatLog, CombatLogEventType};
pub use controller::gate::{DamageOutcome, DamageSource};
pub use controller::tuning::{BossTuning, ConfigError};
pub use controller::{BossController, PresentationView};
pub use headless::HeadlessMatchConfig;
