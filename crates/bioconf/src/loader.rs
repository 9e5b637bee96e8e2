//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, PatchConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    // System config
    let system = PathBuf::from("/etc/biopatch/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("biopatch/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    // CLI override takes precedence over local
    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    // Local override (current directory)
    let local = PathBuf::from("biopatch.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Apply one TOML file onto an existing config.
///
/// Only keys present in the file are overridden, so later files layer
/// on top of earlier ones.
pub fn apply_file(config: &mut PatchConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

fn apply_toml(config: &mut PatchConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if let Some(engine) = table.get("engine").and_then(|v| v.as_table()) {
        if let Some(v) = engine.get("tick_period_ms").and_then(|v| v.as_integer()) {
            config.engine.tick_period_ms = v as u64;
        }
        if let Some(v) = engine.get("buffer_capacity").and_then(|v| v.as_integer()) {
            config.engine.buffer_capacity = v as usize;
        }
        if let Some(v) = engine.get("alert_history").and_then(|v| v.as_integer()) {
            config.engine.alert_history = v as usize;
        }
        if let Some(v) = engine.get("battery_drain_per_tick").and_then(as_float) {
            config.engine.battery_drain_per_tick = v;
        }
        if let Some(v) = engine.get("initial_battery_pct").and_then(as_float) {
            config.engine.initial_battery_pct = v;
        }
    }

    if let Some(thresholds) = table.get("thresholds").and_then(|v| v.as_table()) {
        if let Some(v) = thresholds.get("max_heart_rate_bpm").and_then(as_float) {
            config.thresholds.max_heart_rate_bpm = v;
        }
        if let Some(v) = thresholds.get("emg_spike_uv").and_then(as_float) {
            config.thresholds.emg_spike_uv = v;
        }
        if let Some(v) = thresholds.get("max_temperature_c").and_then(as_float) {
            config.thresholds.max_temperature_c = v;
        }
        if let Some(v) = thresholds.get("low_battery_pct").and_then(as_float) {
            config.thresholds.low_battery_pct = v;
        }
        if let Some(v) = thresholds.get("nuisance_rate").and_then(as_float) {
            config.thresholds.nuisance_rate = v;
        }
        if let Some(v) = thresholds.get("simulate_nuisance").and_then(|v| v.as_bool()) {
            config.thresholds.simulate_nuisance = v;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
    }

    Ok(())
}

/// Accept both `0.1` and `1` for float-typed keys.
fn as_float(value: &toml::Value) -> Option<f64> {
    value.as_float().or_else(|| value.as_integer().map(|v| v as f64))
}

/// Apply `BIOPATCH_*` environment variables on top of the loaded config.
///
/// Unparseable values are ignored rather than fatal; the validated
/// config still has to pass `PatchConfig::validate`.
pub fn apply_env_overrides(config: &mut PatchConfig, sources: &mut ConfigSources) {
    if let Some(v) = env_parse::<u64>("BIOPATCH_TICK_PERIOD_MS", sources) {
        config.engine.tick_period_ms = v;
    }
    if let Some(v) = env_parse::<usize>("BIOPATCH_BUFFER_CAPACITY", sources) {
        config.engine.buffer_capacity = v;
    }
    if let Some(v) = env_parse::<usize>("BIOPATCH_ALERT_HISTORY", sources) {
        config.engine.alert_history = v;
    }
    if let Some(v) = env_parse::<f64>("BIOPATCH_BATTERY_DRAIN_PER_TICK", sources) {
        config.engine.battery_drain_per_tick = v;
    }
    if let Some(v) = env_parse::<f64>("BIOPATCH_INITIAL_BATTERY_PCT", sources) {
        config.engine.initial_battery_pct = v;
    }
    if let Some(v) = env_parse::<f64>("BIOPATCH_MAX_HEART_RATE_BPM", sources) {
        config.thresholds.max_heart_rate_bpm = v;
    }
    if let Some(v) = env_parse::<f64>("BIOPATCH_EMG_SPIKE_UV", sources) {
        config.thresholds.emg_spike_uv = v;
    }
    if let Some(v) = env_parse::<f64>("BIOPATCH_MAX_TEMPERATURE_C", sources) {
        config.thresholds.max_temperature_c = v;
    }
    if let Some(v) = env_parse::<f64>("BIOPATCH_LOW_BATTERY_PCT", sources) {
        config.thresholds.low_battery_pct = v;
    }
    if let Some(v) = env_parse::<f64>("BIOPATCH_NUISANCE_RATE", sources) {
        config.thresholds.nuisance_rate = v;
    }
    if let Some(v) = env_parse::<bool>("BIOPATCH_SIMULATE_NUISANCE", sources) {
        config.thresholds.simulate_nuisance = v;
    }
    if let Ok(v) = env::var("BIOPATCH_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("BIOPATCH_LOG_LEVEL".into());
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, sources: &mut ConfigSources) -> Option<T> {
    let raw = env::var(name).ok()?;
    let parsed = raw.parse().ok()?;
    sources.env_overrides.push(name.to_string());
    Some(parsed)
}
