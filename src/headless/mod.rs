//! Headless mode for automated encounters
//!
//! Runs the boss controller against scripted challengers without any
//! graphical output, suitable for automated testing and tuning.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless encounter
//! cargo run --release -- --headless demos/duo.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "challengers": [
//!     { "name": "Knight", "guards": true },
//!     { "name": "Archer", "attack_range": 14.0, "keep_distance": 10.0 }
//!   ],
//!   "max_ticks": 6000,
//!   "random_seed": 42
//! }
//! ```

pub mod arena;
pub mod config;
pub mod runner;

pub use arena::{Arena, Challenger};
pub use config::{ChallengerConfig, HeadlessMatchConfig};
pub use runner::{
    build_headless_app, run_headless_match, run_to_completion, simulate_match, ChallengerResult,
    HeadlessMatchState, HeadlessPlugin, MatchOutcome, MatchResult,
};
