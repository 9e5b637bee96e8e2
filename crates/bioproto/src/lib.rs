//! Domain types for the BioPatch therapy session engine.
//!
//! Everything that crosses a boundary lives here: session configuration
//! and lifecycle state, biosensor samples, alerts, and the terminal
//! session summary handed to the persistence collaborator. All types
//! are serde-serializable because the summary leaves the process as
//! JSON and the UI consumes snapshots of the rest.
//!
//! This crate is imported by every other BioPatch crate, so it stays
//! free of tokio, rand, and anything else heavier than serde.

pub mod alert;
pub mod session;
pub mod vitals;

pub use alert::{AlertEvent, AlertKind, AlertSeverity};
pub use session::{
    ConfigViolation, SessionConfig, SessionPhase, SessionState, SessionSummary, SessionType,
};
pub use vitals::{AverageVitals, VitalSample};
