//! Biosensor sample types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One synthetic biosensor reading, produced once per tick.
///
/// Immutable once created; ownership moves into the rolling buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSample {
    pub timestamp: DateTime<Utc>,
    /// PPG-derived heart rate. Integer-valued by contract.
    pub heart_rate_bpm: f64,
    /// Heart rate variability in milliseconds.
    pub hrv_ms: f64,
    /// EMG RMS in microvolts. Never below the 10 µV sensor floor.
    pub emg_rms_uv: f64,
    /// Skin temperature in °C, one decimal place.
    pub temperature_c: f64,
    /// EDA response amplitude in microsiemens.
    pub eda_amplitude_us: f64,
    /// EDA peaks counted in the sampling window.
    pub eda_peaks: u32,
}

/// Windowed mean vitals over the retained sample buffer.
///
/// These are averages over the rolling window at completion time, not
/// over the full session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageVitals {
    pub heart_rate_bpm: f64,
    pub emg_rms_uv: f64,
    pub temperature_c: f64,
    pub eda_amplitude_us: f64,
}
