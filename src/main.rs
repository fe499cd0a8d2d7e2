//! boss-sim - headless boss encounter runner
//!
//! Loads a JSON encounter, steps the boss controller against scripted
//! challengers until someone wins or time runs out, and prints the result.

use std::process::ExitCode;

use boss_controller::cli::parse_args;
use boss_controller::headless::run_headless_match;

fn main() -> ExitCode {
    let args = parse_args();

    let config = match args.match_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid match config {}: {}", args.headless.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match run_headless_match(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Encounter failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
