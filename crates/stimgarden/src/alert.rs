//! Safety threshold evaluation
//!
//! Inspects each sample against the configured thresholds and emits at
//! most one alert per tick. Rules run in fixed priority order with
//! physiological alerts ahead of device alerts:
//!
//! 1. HighHeartRate (Warning)
//! 2. EmgSpike (Warning) - absolute threshold or rate-of-change vs. the
//!    rolling window of prior samples (the candidate is never part of
//!    its own baseline)
//! 3. HighTemperature (Warning)
//! 4. LowBattery (Info)
//!
//! Separately from threshold logic there is a simulated nuisance path
//! (`SensorNoise`), consulted only when no rule fired. Real-device
//! integrations disable it via `thresholds.simulate_nuisance` without
//! touching the rules above.

use bioconf::ThresholdConfig;
use bioproto::{AlertEvent, AlertKind, AlertSeverity, VitalSample};
use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::rolling::RollingBuffer;

/// A sample must exceed the window mean by this factor to count as a
/// rate-of-change EMG spike.
const EMG_SURGE_FACTOR: f64 = 1.5;

/// The window must hold at least this many samples before the
/// rate-of-change rule applies.
const EMG_SURGE_MIN_SAMPLES: usize = 5;

/// Stateless-per-sample evaluator; only alert ids and the nuisance RNG
/// carry state across ticks.
pub struct AlertEvaluator {
    thresholds: ThresholdConfig,
    rng: SmallRng,
    next_id: u64,
}

impl AlertEvaluator {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self {
            thresholds,
            rng: SmallRng::from_entropy(),
            next_id: 1,
        }
    }

    /// Deterministic evaluator for reproducible nuisance emission.
    pub fn from_seed(thresholds: ThresholdConfig, seed: u64) -> Self {
        Self {
            thresholds,
            rng: SmallRng::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Classify one sample. Returns at most one alert; first matching
    /// rule wins.
    pub fn evaluate(
        &mut self,
        sample: &VitalSample,
        battery_pct: f64,
        history: &RollingBuffer,
    ) -> Option<AlertEvent> {
        if let Some(alert) = self.threshold_alert(sample, battery_pct, history) {
            return Some(alert);
        }
        self.nuisance_alert(sample.timestamp)
    }

    fn threshold_alert(
        &mut self,
        sample: &VitalSample,
        battery_pct: f64,
        history: &RollingBuffer,
    ) -> Option<AlertEvent> {
        let t = &self.thresholds;

        if sample.heart_rate_bpm > t.max_heart_rate_bpm {
            let message = format!(
                "heart rate {:.0} bpm above limit {:.0}",
                sample.heart_rate_bpm, t.max_heart_rate_bpm
            );
            return Some(self.emit(
                AlertKind::HighHeartRate,
                AlertSeverity::Warning,
                message,
                sample.timestamp,
            ));
        }

        if self.is_emg_spike(sample, history) {
            let message = format!("EMG spike {:.1} µV", sample.emg_rms_uv);
            return Some(self.emit(
                AlertKind::EmgSpike,
                AlertSeverity::Warning,
                message,
                sample.timestamp,
            ));
        }

        if sample.temperature_c > t.max_temperature_c {
            let message = format!(
                "skin temperature {:.1} °C above limit {:.1}",
                sample.temperature_c, t.max_temperature_c
            );
            return Some(self.emit(
                AlertKind::HighTemperature,
                AlertSeverity::Warning,
                message,
                sample.timestamp,
            ));
        }

        if battery_pct < t.low_battery_pct {
            let message = format!("battery at {:.0}%", battery_pct);
            return Some(self.emit(
                AlertKind::LowBattery,
                AlertSeverity::Info,
                message,
                sample.timestamp,
            ));
        }

        None
    }

    fn is_emg_spike(&self, sample: &VitalSample, history: &RollingBuffer) -> bool {
        if sample.emg_rms_uv > self.thresholds.emg_spike_uv {
            return true;
        }
        // Trend rule: a sudden surge relative to the window of prior
        // samples, even if still under the absolute limit. Callers must
        // evaluate before retaining the candidate or the surge drags
        // its own baseline up.
        if history.len() >= EMG_SURGE_MIN_SAMPLES {
            if let Ok(mean) = history.average(|s| s.emg_rms_uv) {
                return sample.emg_rms_uv > mean * EMG_SURGE_FACTOR;
            }
        }
        false
    }

    /// Simulated nuisance alert, bounded by `nuisance_rate` per tick.
    /// Kept apart from threshold logic so real sensors can turn it off.
    fn nuisance_alert(&mut self, timestamp: DateTime<Utc>) -> Option<AlertEvent> {
        if !self.thresholds.simulate_nuisance {
            return None;
        }
        if self.rng.gen::<f64>() >= self.thresholds.nuisance_rate {
            return None;
        }
        Some(self.emit(
            AlertKind::SensorNoise,
            AlertSeverity::Info,
            "transient sensor noise".to_string(),
            timestamp,
        ))
    }

    fn emit(
        &mut self,
        kind: AlertKind,
        severity: AlertSeverity,
        message: String,
        timestamp: DateTime<Utc>,
    ) -> AlertEvent {
        let id = self.next_id;
        self.next_id += 1;
        AlertEvent {
            id,
            kind,
            severity,
            message,
            timestamp,
        }
    }
}
