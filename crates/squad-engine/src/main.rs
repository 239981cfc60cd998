//! # Squad Engine
//!
//! Headless runner for the squad simulation.
//!
//! Usage: `squad-sim [CONFIG_PATH] [--json] [--write-config <PATH>]`
//!
//! Loads the run configuration, lets a scripted player fight the squad for
//! the configured duration, and logs what happens along the way.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod autopilot;
mod config;
mod runner;
mod timing;

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;
use crate::runner::Simulation;

/// Command line options.
#[derive(Debug, Parser)]
#[command(author, version, about = "Headless squad simulation runner", long_about = None)]
struct Args {
    /// Run config (TOML); a missing file falls back to defaults
    config_path: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,

    /// Write the resolved config here and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

/// Main entry point.
fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::from_default_env()
        .add_directive("squad_ai=info".parse()?)
        .add_directive("squad_sim=info".parse()?);
    if args.json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
    }

    info!("Squad simulation starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config_path {
        Some(path) if path.exists() => EngineConfig::try_load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::default(),
    };
    config.validate();
    config.check().context("invalid simulation config")?;

    if let Some(path) = &args.write_config {
        config
            .save_to(path)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        return Ok(());
    }

    let seed = config.seed.unwrap_or_else(clock_seed);
    info!(seed, duration = config.duration_secs, tick_rate = config.tick_rate, "Starting run");

    let mut simulation = Simulation::new(&config, seed);
    let summary = if config.realtime {
        simulation.run_realtime()
    } else {
        simulation.run()
    };

    if let Some(path) = &config.snapshot_path {
        let json = serde_json::to_string_pretty(&simulation.world().snapshot()).context("failed to encode snapshot")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, json).with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        info!("Wrote snapshot to {}", path.display());
    }

    info!(
        seed = summary.seed,
        outcome = ?summary.outcome,
        ticks = summary.ticks,
        elapsed = summary.elapsed,
        living_agents = summary.living_agents,
        player_health = summary.player_health,
        events = summary.events,
        "Squad simulation shutdown complete"
    );
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_accept_flags_in_any_order() {
        let args = Args::try_parse_from(["squad-sim", "--json", "--write-config", "out.toml", "run.toml"])
            .expect("valid args");
        assert!(args.json);
        assert_eq!(args.write_config, Some(PathBuf::from("out.toml")));
        assert_eq!(args.config_path, Some(PathBuf::from("run.toml")));
    }

    #[test]
    fn test_args_default_to_nothing() {
        let args = Args::try_parse_from(["squad-sim"]).expect("valid args");
        assert!(!args.json);
        assert!(args.config_path.is_none());
        assert!(args.write_config.is_none());
    }

    #[test]
    fn test_args_reject_unknown_and_incomplete_flags() {
        assert!(Args::try_parse_from(["squad-sim", "--jsn"]).is_err());
        assert!(Args::try_parse_from(["squad-sim", "--write-config"]).is_err());
        assert!(Args::try_parse_from(["squad-sim", "a.toml", "b.toml"]).is_err());
    }
}
