use std::{fs, path::Path};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tapster_agent::EngineConfig;
use tapster_reward::RewardConfig;
use tapster_vision::PerceptionConfig;
use tracing_subscriber::EnvFilter;

use self::{classify::ClassifyArg, simulate::SimulateArg};

mod classify;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run the perception pipeline on a saved screenshot and emit the
    /// resulting state snapshot as JSON
    Classify(#[clap(flatten)] ClassifyArg),
    /// Drive the ingest -> select -> score loop on synthetic states
    Simulate(#[clap(flatten)] SimulateArg),
}

/// Top-level configuration file: every component config in one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub perception: PerceptionConfig,
    pub engine: EngineConfig,
    pub reward: RewardConfig,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

pub fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CommandArgs::parse();
    match args.mode {
        Mode::Classify(arg) => classify::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
    }
    Ok(())
}
