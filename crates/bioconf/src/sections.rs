//! Configuration sections with compiled defaults.

use serde::{Deserialize, Serialize};

/// Tick loop and resource model of the session engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tick period in milliseconds.
    /// Default: 1000 (one sample per second)
    #[serde(default = "EngineConfig::default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Rolling buffer capacity in samples.
    /// Default: 20
    #[serde(default = "EngineConfig::default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// How many recent alerts to retain.
    /// Default: 5
    #[serde(default = "EngineConfig::default_alert_history")]
    pub alert_history: usize,

    /// Battery drain per tick in percentage points.
    /// Default: 0.01
    #[serde(default = "EngineConfig::default_battery_drain_per_tick")]
    pub battery_drain_per_tick: f64,

    /// Battery level a fresh session starts with, in percent.
    /// Default: 85.0
    #[serde(default = "EngineConfig::default_initial_battery_pct")]
    pub initial_battery_pct: f64,
}

impl EngineConfig {
    fn default_tick_period_ms() -> u64 {
        1000
    }

    fn default_buffer_capacity() -> usize {
        20
    }

    fn default_alert_history() -> usize {
        5
    }

    fn default_battery_drain_per_tick() -> f64 {
        0.01
    }

    fn default_initial_battery_pct() -> f64 {
        85.0
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: Self::default_tick_period_ms(),
            buffer_capacity: Self::default_buffer_capacity(),
            alert_history: Self::default_alert_history(),
            battery_drain_per_tick: Self::default_battery_drain_per_tick(),
            initial_battery_pct: Self::default_initial_battery_pct(),
        }
    }
}

/// Safety limits for the alert evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Heart rate above this raises `HighHeartRate`.
    /// Default: 110.0 bpm
    #[serde(default = "ThresholdConfig::default_max_heart_rate_bpm")]
    pub max_heart_rate_bpm: f64,

    /// EMG RMS above this raises `EmgSpike`.
    /// Default: 90.0 µV
    #[serde(default = "ThresholdConfig::default_emg_spike_uv")]
    pub emg_spike_uv: f64,

    /// Skin temperature above this raises `HighTemperature`.
    /// Default: 38.0 °C
    #[serde(default = "ThresholdConfig::default_max_temperature_c")]
    pub max_temperature_c: f64,

    /// Battery below this raises `LowBattery`.
    /// Default: 20.0 %
    #[serde(default = "ThresholdConfig::default_low_battery_pct")]
    pub low_battery_pct: f64,

    /// Probability per tick of a simulated nuisance alert.
    /// Default: 0.10
    #[serde(default = "ThresholdConfig::default_nuisance_rate")]
    pub nuisance_rate: f64,

    /// Whether the nuisance path is active at all. Real-device
    /// integrations turn this off without touching threshold logic.
    /// Default: true
    #[serde(default = "ThresholdConfig::default_simulate_nuisance")]
    pub simulate_nuisance: bool,
}

impl ThresholdConfig {
    fn default_max_heart_rate_bpm() -> f64 {
        110.0
    }

    fn default_emg_spike_uv() -> f64 {
        90.0
    }

    fn default_max_temperature_c() -> f64 {
        38.0
    }

    fn default_low_battery_pct() -> f64 {
        20.0
    }

    fn default_nuisance_rate() -> f64 {
        0.10
    }

    fn default_simulate_nuisance() -> bool {
        true
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            max_heart_rate_bpm: Self::default_max_heart_rate_bpm(),
            emg_spike_uv: Self::default_emg_spike_uv(),
            max_temperature_c: Self::default_max_temperature_c(),
            low_battery_pct: Self::default_low_battery_pct(),
            nuisance_rate: Self::default_nuisance_rate(),
            simulate_nuisance: Self::default_simulate_nuisance(),
        }
    }
}

/// Telemetry and observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
