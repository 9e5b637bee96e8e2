//! Session configuration, lifecycle state, and the terminal summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::vitals::AverageVitals;

/// Stimulation modality for a therapy session.
///
/// Serialized names match the persistence contract of the session
/// recording backend ("TENS" / "Microcurrent").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionType {
    #[serde(rename = "TENS")]
    Tens,
    Microcurrent,
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionType::Tens => write!(f, "TENS"),
            SessionType::Microcurrent => write!(f, "Microcurrent"),
        }
    }
}

/// Immutable per-session configuration, fixed at session creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub session_type: SessionType,
    /// Target session length in seconds. Must be positive.
    pub target_duration_secs: u32,
    pub frequency_hz: f64,
    /// Intensity in % for TENS, µA for microcurrent.
    pub intensity: f64,
    /// Pulse width in microseconds. TENS only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_width_us: Option<u32>,
}

/// A configuration that cannot describe a runnable session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigViolation {
    #[error("target duration must be positive")]
    ZeroDuration,
    #[error("TENS sessions require a pulse width")]
    MissingPulseWidth,
    #[error("pulse width is only meaningful for TENS")]
    UnexpectedPulseWidth,
}

impl SessionConfig {
    /// Default TENS profile: 85 Hz, 65 % intensity, 250 µs pulses, 25 minutes.
    pub fn tens() -> Self {
        Self {
            session_type: SessionType::Tens,
            target_duration_secs: 25 * 60,
            frequency_hz: 85.0,
            intensity: 65.0,
            pulse_width_us: Some(250),
        }
    }

    /// Default microcurrent profile: 0.5 Hz, 500 µA, 60 minutes.
    pub fn microcurrent() -> Self {
        Self {
            session_type: SessionType::Microcurrent,
            target_duration_secs: 60 * 60,
            frequency_hz: 0.5,
            intensity: 500.0,
            pulse_width_us: None,
        }
    }

    /// Same profile with a different target duration.
    pub fn with_duration(mut self, secs: u32) -> Self {
        self.target_duration_secs = secs;
        self
    }

    /// Check the cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigViolation> {
        if self.target_duration_secs == 0 {
            return Err(ConfigViolation::ZeroDuration);
        }
        match (self.session_type, self.pulse_width_us) {
            (SessionType::Tens, None) => Err(ConfigViolation::MissingPulseWidth),
            (SessionType::Microcurrent, Some(_)) => Err(ConfigViolation::UnexpectedPulseWidth),
            _ => Ok(()),
        }
    }
}

/// Lifecycle phase of a session. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Running,
    Paused,
    Completed,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Completed)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Running => "running",
            SessionPhase::Paused => "paused",
            SessionPhase::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// Read-only snapshot of a session's mutable state.
///
/// The engine owns the live state; consumers only ever see copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Whole seconds elapsed while running. Non-decreasing.
    pub elapsed_secs: u32,
    /// Set once, on the first transition out of `Idle`.
    pub started_at: Option<DateTime<Utc>>,
    /// Device battery in percent. Non-increasing while running.
    pub battery_pct: f64,
}

/// Terminal aggregate record, produced exactly once per session.
///
/// `average_vitals` is computed over the rolling buffer's contents at
/// completion time, i.e. a windowed approximation over the most recent
/// samples rather than the full session history. `None` when the
/// session completed before any sample was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub session_type: SessionType,
    pub total_duration_secs: u32,
    pub config: SessionConfig,
    pub average_vitals: Option<AverageVitals>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presets_validate() {
        assert_eq!(SessionConfig::tens().validate(), Ok(()));
        assert_eq!(SessionConfig::microcurrent().validate(), Ok(()));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = SessionConfig::tens().with_duration(0);
        assert_eq!(config.validate(), Err(ConfigViolation::ZeroDuration));
    }

    #[test]
    fn test_pulse_width_cross_checks() {
        let mut tens = SessionConfig::tens();
        tens.pulse_width_us = None;
        assert_eq!(tens.validate(), Err(ConfigViolation::MissingPulseWidth));

        let mut micro = SessionConfig::microcurrent();
        micro.pulse_width_us = Some(250);
        assert_eq!(micro.validate(), Err(ConfigViolation::UnexpectedPulseWidth));
    }

    #[test]
    fn test_session_type_wire_names() {
        let tens = serde_json::to_string(&SessionType::Tens).unwrap();
        assert_eq!(tens, "\"TENS\"");
        let micro = serde_json::to_string(&SessionType::Microcurrent).unwrap();
        assert_eq!(micro, "\"Microcurrent\"");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = SessionConfig::tens().with_duration(300);
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_microcurrent_omits_pulse_width() {
        let json = serde_json::to_string(&SessionConfig::microcurrent()).unwrap();
        assert!(!json.contains("pulse_width_us"));
    }
}
