//! Stimgarden: BioPatch Therapy Session Engine
//!
//! Drives a timed TENS or microcurrent therapy session: a finite state
//! machine over the session lifecycle, a once-per-second simulation of
//! the wearable's biosensor stream, threshold-based safety alerting,
//! and a windowed summary handed off on completion.
//!
//! Layering, leaves first:
//!
//! - **signal**: synthetic vital-sign samples from a seeded stochastic
//!   model
//! - **rolling**: fixed-capacity FIFO window over recent samples
//! - **alert**: threshold evaluation plus the simulated nuisance path
//! - **controller**: the synchronous state machine owning all mutable
//!   session state
//! - **runtime**: the tokio tick driver and the `SessionRecorder`
//!   persistence boundary
//!
//! The controller is deliberately runtime-free; everything about a
//! session can be exercised tick-by-tick in plain synchronous tests.

pub mod alert;
pub mod controller;
pub mod rolling;
pub mod runtime;
pub mod signal;

pub use alert::AlertEvaluator;
pub use controller::{SessionController, SessionError, TickOutcome};
pub use rolling::{BufferError, RollingBuffer};
pub use runtime::{ChannelRecorder, LoggingRecorder, SessionRecorder, SessionRuntime};
pub use signal::SignalGenerator;
