//! Synthetic biosensor signal model
//!
//! Produces one [`VitalSample`] per tick from a base-plus-sinusoid-plus-noise
//! model calibrated against the BioPatch wearable's BLE firmware simulator.
//! Two regimes exist, selected by the activity flag: resting, and under
//! active stimulation (elevated heart rate, EMG, and EDA baselines).
//!
//! All randomness flows through one injected [`SmallRng`], so a seeded
//! generator replays the exact same sample stream.

use bioproto::VitalSample;
use chrono::Utc;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

// Resting / active baselines.
const HR_BASE_RESTING: f64 = 72.0;
const HR_BASE_ACTIVE: f64 = 85.0;
const HRV_BASE_RESTING: f64 = 35.0;
const HRV_BASE_ACTIVE: f64 = 25.0;
const EMG_BASE_RESTING: f64 = 35.0;
const EMG_BASE_ACTIVE: f64 = 60.0;
const EDA_PEAKS_RESTING: f64 = 3.0;
const EDA_PEAKS_ACTIVE: f64 = 8.0;
const TEMP_BASE_C: f64 = 36.5;

/// EMG readings below this are sensor noise; clamp up to it.
const EMG_FLOOR_UV: f64 = 10.0;
const HRV_FLOOR_MS: f64 = 5.0;

/// Generates the simulated vital-sign stream.
///
/// Sample values are a pure function of `(elapsed_secs, active)` and the
/// internal RNG state; the timestamp is the only wall-clock input.
pub struct SignalGenerator {
    rng: SmallRng,
}

impl SignalGenerator {
    /// Generator with an entropy-seeded RNG (the production path).
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Deterministic generator for reproducible streams.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Produce the sample for one tick.
    ///
    /// `active` is true while a stimulation modality is running, which
    /// raises the physiological baselines.
    pub fn next(&mut self, elapsed_secs: u32, active: bool) -> VitalSample {
        // The firmware model cycles over a 60-second window.
        let t = (elapsed_secs % 60) as f64;

        // Heart rate: slow sinusoid (period ~60s, amplitude 8) plus ±2 noise.
        let hr_base = if active { HR_BASE_ACTIVE } else { HR_BASE_RESTING };
        let heart_rate_bpm =
            (hr_base + (t * 0.1).sin() * 8.0 + self.rng.gen_range(-2.0..2.0)).round();

        let hrv_base = if active { HRV_BASE_ACTIVE } else { HRV_BASE_RESTING };
        let hrv_ms = round1((hrv_base + self.rng.gen_range(-5.0..5.0)).max(HRV_FLOOR_MS));

        // EMG: activity sinusoid of amplitude 20 plus ±7.5 noise, floored.
        let emg_base = if active { EMG_BASE_ACTIVE } else { EMG_BASE_RESTING };
        let emg_rms_uv = round1(
            (emg_base + (t * 0.3).sin() * 20.0 + self.rng.gen_range(-7.5..7.5)).max(EMG_FLOOR_UV),
        );

        let temperature_c = round1(TEMP_BASE_C + self.rng.gen_range(-0.2..0.2));

        let eda_base = if active { EDA_PEAKS_ACTIVE } else { EDA_PEAKS_RESTING };
        let eda_peaks = (eda_base + self.rng.gen_range(0.0..5.0)).round() as u32;
        let eda_amplitude_us = round1(2.5 + self.rng.gen_range(0.0..2.0));

        VitalSample {
            timestamp: Utc::now(),
            heart_rate_bpm,
            hrv_ms,
            emg_rms_uv,
            temperature_c,
            eda_amplitude_us,
            eda_peaks,
        }
    }
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
