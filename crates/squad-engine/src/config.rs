//! Run configuration.
//!
//! Wraps the simulation tunables with the parameters of a headless run.
//! Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use squad_ai::SimConfig;
use squad_common::{ConfigError, SquadError, SquadResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::autopilot::AutopilotConfig;

/// Headless run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Run Settings ===
    /// World seed (None = derived from the clock)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Simulated seconds to run
    pub duration_secs: f32,
    /// Fixed simulation steps per second
    pub tick_rate: u32,
    /// Pace the run against the wall clock
    pub realtime: bool,
    /// Seconds between squad status logs
    pub status_interval: f32,
    /// Where to write the final snapshot as JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,

    // === Player Autopilot ===
    /// Scripted player behavior
    pub autopilot: AutopilotConfig,

    // === Simulation ===
    /// Simulation tunables
    pub sim: SimConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            seed: None,
            duration_secs: 60.0,
            tick_rate: 60,
            realtime: false,
            status_interval: 5.0,
            snapshot_path: None,
            autopilot: AutopilotConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read a TOML run file, falling back to defaults when it is absent or
    /// unreadable.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.is_file() {
            info!("No run config at {}, using defaults", path.display());
            return Self::default();
        }
        Self::try_load_from(path).unwrap_or_else(|e| {
            warn!("Ignoring run config {}: {e}", path.display());
            Self::default()
        })
    }

    /// Read a TOML run file. Missing keys take their defaults.
    pub fn try_load_from(path: impl AsRef<Path>) -> SquadResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = toml::from_str(&text).map_err(|e| SquadError::Serialization(e.to_string()))?;
        info!("Run config read from {}", path.display());
        Ok(config)
    }

    /// Write the config as TOML, creating missing directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> SquadResult<()> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self).map_err(|e| SquadError::Serialization(e.to_string()))?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, text)?;
        info!("Run config written to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(10, 1000);
        self.duration_secs = self.duration_secs.clamp(0.0, 86_400.0);
        self.status_interval = self.status_interval.max(0.1);
        self.autopilot.validate();
        self.sim.validate();
    }

    /// Strict check of the simulation tunables.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.sim.check()
    }

    /// Seconds per fixed step.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}
