//! Alert events raised by the safety evaluator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What tripped the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    HighHeartRate,
    EmgSpike,
    HighTemperature,
    LowBattery,
    /// Simulated nuisance alert, only emitted when no real sensor is
    /// attached. Never produced by threshold evaluation.
    SensorNoise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
}

/// One alert, retained in the capped recent-alerts list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Monotonically increasing per session.
    pub id: u64,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        let kind = serde_json::to_string(&AlertKind::HighHeartRate).unwrap();
        assert_eq!(kind, "\"high_heart_rate\"");
        let severity = serde_json::to_string(&AlertSeverity::Warning).unwrap();
        assert_eq!(severity, "\"warning\"");
    }
}
