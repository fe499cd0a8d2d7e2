//! Command-line interface for the boss simulator

use clap::Parser;
use std::path::PathBuf;

use crate::controller::tuning::ConfigError;
use crate::headless::HeadlessMatchConfig;

/// Step-driven boss encounter simulator
#[derive(Parser, Debug)]
#[command(name = "boss-sim")]
#[command(about = "Step-driven boss encounter simulator")]
#[command(version)]
pub struct Args {
    /// Run a headless encounter with the specified JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: PathBuf,

    /// Output path for the combat log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum encounter length in steps
    #[arg(long, value_name = "TICKS")]
    pub max_ticks: Option<u64>,

    /// RON tuning file for the boss
    #[arg(long, value_name = "TUNING_FILE")]
    pub tuning: Option<PathBuf>,

    /// Random seed for a reproducible encounter
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    /// Load the match config and apply command-line overrides
    pub fn match_config(&self) -> Result<HeadlessMatchConfig, ConfigError> {
        let mut config = HeadlessMatchConfig::load_from_file(&self.headless)?;
        if let Some(output) = &self.output {
            config.output_path = Some(output.to_string_lossy().into_owned());
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        if let Some(tuning) = &self.tuning {
            config.tuning_path = Some(tuning.to_string_lossy().into_owned());
        }
        if self.seed.is_some() {
            config.random_seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn parse_args() -> Args {
    Args::parse()
}
