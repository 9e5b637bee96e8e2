//! Tokio tick driver and the persistence collaborator boundary
//!
//! `SessionRuntime` owns one [`SessionController`] behind a lock and
//! drives it with a single tokio task ticking at the configured period.
//! One task per running session means ticks are strictly ordered and
//! never re-entrant; the lock is held across the whole tick, so any
//! command that changes phase is observed by the very next tick.
//!
//! `MissedTickBehavior::Burst` delivers delayed ticks instead of
//! dropping them, so the tick-counted elapsed time cannot under-count
//! if the host stalls.
//!
//! Cancellation rules:
//! - `stop()` and pausing abort the tick task before returning.
//! - Dropping the runtime aborts any outstanding task, so a discarded
//!   session can never keep mutating state.
//! - Even if an in-flight tick loses the race with a transition, the
//!   controller's phase check makes it a no-op.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use bioconf::PatchConfig;
use bioproto::{AlertEvent, SessionPhase, SessionState, SessionSummary, VitalSample};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::controller::{SessionController, SessionError, TickOutcome};

/// Receives the terminal summary, exactly once per session.
///
/// Persistence (and any retry policy) is entirely the implementor's
/// concern; the engine never waits on it and never retries.
pub trait SessionRecorder: Send + Sync {
    fn record(&self, summary: &SessionSummary);
}

/// Default recorder: logs the summary where the surrounding app would
/// forward it to the session-recording backend.
pub struct LoggingRecorder;

impl SessionRecorder for LoggingRecorder {
    fn record(&self, summary: &SessionSummary) {
        match serde_json::to_string(summary) {
            Ok(json) => info!(session = %summary.id, summary = %json, "session summary"),
            Err(e) => warn!(session = %summary.id, error = %e, "summary not serializable"),
        }
    }
}

/// Recorder that forwards summaries over a channel; used by tests and
/// by embedders that persist asynchronously.
pub struct ChannelRecorder {
    tx: mpsc::UnboundedSender<SessionSummary>,
}

impl ChannelRecorder {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionSummary>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SessionRecorder for ChannelRecorder {
    fn record(&self, summary: &SessionSummary) {
        // A dropped receiver is the collaborator's business, not ours.
        if self.tx.send(summary.clone()).is_err() {
            warn!(session = %summary.id, "summary receiver dropped");
        }
    }
}

/// Drives one session on the tokio runtime.
///
/// Must be used from within a tokio runtime context; `start` and
/// resume spawn the tick task.
pub struct SessionRuntime {
    controller: Arc<RwLock<SessionController>>,
    recorder: Arc<dyn SessionRecorder>,
    tick_period: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl SessionRuntime {
    pub fn new(
        controller: SessionController,
        patch: &PatchConfig,
        recorder: Arc<dyn SessionRecorder>,
    ) -> Self {
        Self {
            controller: Arc::new(RwLock::new(controller)),
            recorder,
            tick_period: Duration::from_millis(patch.engine.tick_period_ms),
            ticker: Mutex::new(None),
        }
    }

    /// Start the session and the tick loop.
    pub fn start(&self) -> Result<(), SessionError> {
        self.controller.write().unwrap().start()?;
        self.spawn_ticker();
        Ok(())
    }

    /// Pause or resume. Pausing cancels the timer (no samples while
    /// paused); resuming arms a fresh one.
    pub fn toggle_pause(&self) -> Result<SessionPhase, SessionError> {
        let phase = self.controller.write().unwrap().toggle_pause()?;
        match phase {
            SessionPhase::Paused => self.cancel_ticker(),
            SessionPhase::Running => self.spawn_ticker(),
            // toggle_pause only ever returns Running or Paused.
            _ => {}
        }
        Ok(phase)
    }

    /// Stop the session, cancel the timer, and hand the summary to the
    /// recorder. The timer is dead before this returns.
    pub fn stop(&self) -> Result<SessionSummary, SessionError> {
        let summary = self.controller.write().unwrap().stop()?;
        self.cancel_ticker();
        self.recorder.record(&summary);
        Ok(summary)
    }

    pub fn state(&self) -> SessionState {
        self.controller.read().unwrap().state()
    }

    pub fn latest_sample(&self) -> Option<VitalSample> {
        self.controller.read().unwrap().latest_sample()
    }

    pub fn sample_window(&self) -> Vec<VitalSample> {
        self.controller.read().unwrap().sample_window()
    }

    pub fn recent_alerts(&self) -> Vec<AlertEvent> {
        self.controller.read().unwrap().recent_alerts()
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        self.controller.read().unwrap().summary().cloned()
    }

    fn spawn_ticker(&self) {
        let controller = Arc::clone(&self.controller);
        let recorder = Arc::clone(&self.recorder);
        let period = self.tick_period;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            // The first tick of a tokio interval completes immediately;
            // consume it so every sample is one full period apart.
            interval.tick().await;

            loop {
                interval.tick().await;
                let outcome = controller.write().unwrap().tick();
                match outcome {
                    TickOutcome::Advanced => {}
                    TickOutcome::Completed(summary) => {
                        recorder.record(&summary);
                        break;
                    }
                    // Phase changed under us (stop/pause raced the
                    // timer); the command path owns the cleanup.
                    TickOutcome::Skipped => break,
                }
            }
        });

        if let Some(old) = self.ticker.lock().unwrap().replace(handle) {
            old.abort();
        }
    }

    fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        // No orphaned timers: teardown cancels even without stop().
        self.cancel_ticker();
    }
}
