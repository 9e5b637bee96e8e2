//! Fixed-capacity FIFO window over recent samples
//!
//! Holds the most recent N samples for trend display and the windowed
//! summary statistics. Pushing beyond capacity evicts the oldest sample,
//! so the buffer is O(capacity) memory and O(1) amortized per push.

use std::collections::VecDeque;

use bioproto::{AverageVitals, VitalSample};
use thiserror::Error;

/// Statistics requested with no data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("no samples in buffer")]
    Empty,
}

/// Ordered window of the most recent samples, oldest first.
pub struct RollingBuffer {
    samples: VecDeque<VitalSample>,
    capacity: usize,
}

impl RollingBuffer {
    /// Buffer holding at most `capacity` samples. Capacity must be
    /// positive; config validation guarantees this upstream.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest if the window is full.
    pub fn push(&mut self, sample: VitalSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<&VitalSample> {
        self.samples.back()
    }

    /// Owned copy of the window in chronological order.
    ///
    /// Consumers only ever get this copy, never the live buffer.
    pub fn snapshot(&self) -> Vec<VitalSample> {
        self.samples.iter().cloned().collect()
    }

    /// Arithmetic mean of one field over the current window.
    pub fn average<F>(&self, field: F) -> Result<f64, BufferError>
    where
        F: Fn(&VitalSample) -> f64,
    {
        if self.samples.is_empty() {
            return Err(BufferError::Empty);
        }
        let sum: f64 = self.samples.iter().map(&field).sum();
        Ok(sum / self.samples.len() as f64)
    }

    /// Windowed mean of every summarized vital.
    pub fn averages(&self) -> Result<AverageVitals, BufferError> {
        Ok(AverageVitals {
            heart_rate_bpm: self.average(|s| s.heart_rate_bpm)?,
            emg_rms_uv: self.average(|s| s.emg_rms_uv)?,
            temperature_c: self.average(|s| s.temperature_c)?,
            eda_amplitude_us: self.average(|s| s.eda_amplitude_us)?,
        })
    }
}
