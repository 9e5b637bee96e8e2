//! Minimal configuration loading for BioPatch.
//!
//! This crate provides configuration loading with minimal dependencies,
//! designed to be imported by every BioPatch crate without pulling in
//! the engine or the async runtime.
//!
//! # Configuration Philosophy
//!
//! Configuration covers the knobs of the session engine that are fixed
//! for the lifetime of a session but vary between deployments:
//!
//! - **Engine** (`EngineConfig`): tick period, buffer sizes, battery
//!   model.
//! - **Thresholds** (`ThresholdConfig`): safety limits for the alert
//!   evaluator, plus the simulated nuisance-alert rate.
//! - **Telemetry** (`TelemetryConfig`): log level.
//!
//! Per-session parameters (modality, duration, intensity) are *not*
//! configuration; they arrive with each `SessionConfig`.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/biopatch/config.toml` (system)
//! 2. `~/.config/biopatch/config.toml` (user)
//! 3. `./biopatch.toml` (local override)
//! 4. Environment variables (`BIOPATCH_*`)
//!
//! # Example Config
//!
//! ```toml
//! [engine]
//! tick_period_ms = 1000
//! buffer_capacity = 20
//! alert_history = 5
//!
//! [thresholds]
//! max_heart_rate_bpm = 110.0
//! emg_spike_uv = 90.0
//! low_battery_pct = 20.0
//! nuisance_rate = 0.1
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{EngineConfig, TelemetryConfig, ThresholdConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Complete BioPatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PatchConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub thresholds: ThresholdConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl PatchConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/biopatch/config.toml`
    /// 3. `~/.config/biopatch/config.toml`
    /// 4. `./biopatch.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env
    /// overrides.
    ///
    /// If `config_path` is provided, it takes precedence over the local
    /// `./biopatch.toml` override. System and user configs still load
    /// first.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = PatchConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::apply_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        config.validate()?;
        Ok((config, sources))
    }

    /// Check value ranges after all sources have been applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.tick_period_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "engine.tick_period_ms must be positive".into(),
            });
        }
        if self.engine.buffer_capacity == 0 {
            return Err(ConfigError::Invalid {
                message: "engine.buffer_capacity must be positive".into(),
            });
        }
        if self.engine.alert_history == 0 {
            return Err(ConfigError::Invalid {
                message: "engine.alert_history must be positive".into(),
            });
        }
        if self.engine.battery_drain_per_tick < 0.0 {
            return Err(ConfigError::Invalid {
                message: "engine.battery_drain_per_tick must not be negative".into(),
            });
        }
        if !(0.0..=100.0).contains(&self.engine.initial_battery_pct) {
            return Err(ConfigError::Invalid {
                message: "engine.initial_battery_pct must be within 0..=100".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.thresholds.nuisance_rate) {
            return Err(ConfigError::Invalid {
                message: "thresholds.nuisance_rate must be within 0..=1".into(),
            });
        }
        Ok(())
    }
}
