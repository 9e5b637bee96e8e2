//! Session lifecycle state machine
//!
//! `SessionController` owns everything mutable about one therapy
//! session: the phase, elapsed time, battery model, rolling sample
//! window, and recent alerts. It is synchronous and self-contained;
//! the tokio driver in [`crate::runtime`] calls [`SessionController::tick`]
//! once per period and otherwise stays out of the way, which keeps the
//! whole state machine testable without a runtime.
//!
//! Phases: `Idle -> Running <-> Paused -> Completed`, with `Completed`
//! terminal. Commands issued in a phase that does not permit them
//! return [`SessionError::InvalidTransition`] and leave state untouched.

use bioconf::{EngineConfig, PatchConfig};
use bioproto::{
    AlertEvent, ConfigViolation, SessionConfig, SessionPhase, SessionState, SessionSummary,
    VitalSample,
};
use chrono::Utc;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::alert::AlertEvaluator;
use crate::rolling::RollingBuffer;
use crate::signal::SignalGenerator;

/// Errors surfaced to the host for misused commands or bad config.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {command} while {phase}")]
    InvalidTransition {
        phase: SessionPhase,
        command: &'static str,
    },

    #[error(transparent)]
    InvalidConfig(#[from] ConfigViolation),
}

/// What one call to [`SessionController::tick`] did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Phase was not `Running`; nothing happened.
    Skipped,
    /// One tick of simulation ran; the session continues.
    Advanced,
    /// The target duration was reached; the session finalized itself.
    Completed(SessionSummary),
}

/// The finite state machine driving one therapy session.
pub struct SessionController {
    id: Uuid,
    config: SessionConfig,
    engine: EngineConfig,

    phase: SessionPhase,
    elapsed_secs: u32,
    started_at: Option<chrono::DateTime<Utc>>,
    battery_pct: f64,

    buffer: RollingBuffer,
    alerts: VecDeque<AlertEvent>,
    generator: SignalGenerator,
    evaluator: AlertEvaluator,

    summary: Option<SessionSummary>,
}

impl SessionController {
    /// Controller with entropy-seeded randomness (the production path).
    pub fn new(config: SessionConfig, patch: &PatchConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self::build(
            config,
            patch,
            SignalGenerator::new(),
            AlertEvaluator::new(patch.thresholds.clone()),
        ))
    }

    /// Deterministic controller: the sample stream and nuisance alerts
    /// replay exactly for a given seed.
    pub fn from_seed(
        config: SessionConfig,
        patch: &PatchConfig,
        seed: u64,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self::build(
            config,
            patch,
            SignalGenerator::from_seed(seed),
            // Decorrelate the two streams while keeping one knob.
            AlertEvaluator::from_seed(patch.thresholds.clone(), seed.wrapping_add(1)),
        ))
    }

    fn build(
        config: SessionConfig,
        patch: &PatchConfig,
        generator: SignalGenerator,
        evaluator: AlertEvaluator,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine: patch.engine.clone(),
            phase: SessionPhase::Idle,
            elapsed_secs: 0,
            started_at: None,
            battery_pct: patch.engine.initial_battery_pct,
            buffer: RollingBuffer::new(patch.engine.buffer_capacity),
            alerts: VecDeque::with_capacity(patch.engine.alert_history),
            generator,
            evaluator,
            summary: None,
            config,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Begin the session. Valid only from `Idle`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                command: "start",
            });
        }
        self.started_at = Some(Utc::now());
        self.phase = SessionPhase::Running;
        info!(session = %self.id, session_type = %self.config.session_type, "session started");
        Ok(())
    }

    /// Flip between `Running` and `Paused`. Returns the new phase.
    pub fn toggle_pause(&mut self) -> Result<SessionPhase, SessionError> {
        self.phase = match self.phase {
            SessionPhase::Running => SessionPhase::Paused,
            SessionPhase::Paused => SessionPhase::Running,
            phase => {
                return Err(SessionError::InvalidTransition {
                    phase,
                    command: "toggle_pause",
                })
            }
        };
        info!(session = %self.id, phase = %self.phase, "session pause toggled");
        Ok(self.phase)
    }

    /// End the session early. Valid from `Running` or `Paused`; produces
    /// the one and only summary.
    pub fn stop(&mut self) -> Result<SessionSummary, SessionError> {
        match self.phase {
            SessionPhase::Running | SessionPhase::Paused => Ok(self.finalize()),
            phase => Err(SessionError::InvalidTransition {
                phase,
                command: "stop",
            }),
        }
    }

    /// One simulation step. Called by the tick driver once per period
    /// while the session runs; a no-op in any other phase, so a tick
    /// racing a phase transition can never generate a stray sample.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SessionPhase::Running {
            return TickOutcome::Skipped;
        }

        self.elapsed_secs += 1;

        let sample = self.generator.next(self.elapsed_secs, true);

        self.battery_pct = (self.battery_pct - self.engine.battery_drain_per_tick).max(0.0);

        // Evaluate against the window of prior samples only; pushing
        // first would fold the candidate into the trend baseline and
        // damp the rate-of-change rule.
        if let Some(alert) = self.evaluator.evaluate(&sample, self.battery_pct, &self.buffer) {
            debug!(session = %self.id, kind = ?alert.kind, "alert raised");
            self.push_alert(alert);
        }

        self.buffer.push(sample);

        // Auto-completion: checked on every tick, not just on user
        // action, so the session can never run past its target.
        if self.elapsed_secs >= self.config.target_duration_secs {
            return TickOutcome::Completed(self.finalize());
        }

        TickOutcome::Advanced
    }

    /// Newest-first, capped at the configured history length.
    fn push_alert(&mut self, alert: AlertEvent) {
        if self.alerts.len() == self.engine.alert_history {
            self.alerts.pop_back();
        }
        self.alerts.push_front(alert);
    }

    /// Shared terminal transition for `stop()` and auto-completion.
    /// Callers have already checked the phase, so this runs at most
    /// once per session.
    fn finalize(&mut self) -> SessionSummary {
        self.phase = SessionPhase::Completed;
        let summary = SessionSummary {
            id: self.id,
            session_type: self.config.session_type,
            total_duration_secs: self.elapsed_secs,
            config: self.config.clone(),
            average_vitals: self.buffer.averages().ok(),
            started_at: self.started_at,
            ended_at: Utc::now(),
            completed: true,
        };
        self.summary = Some(summary.clone());
        info!(
            session = %self.id,
            duration_secs = self.elapsed_secs,
            "session completed"
        );
        summary
    }

    /// Read-only snapshot of the mutable state.
    pub fn state(&self) -> SessionState {
        SessionState {
            phase: self.phase,
            elapsed_secs: self.elapsed_secs,
            started_at: self.started_at,
            battery_pct: self.battery_pct,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Most recent sample, or `None` before the first tick.
    pub fn latest_sample(&self) -> Option<VitalSample> {
        self.buffer.latest().cloned()
    }

    /// Chronological copy of the retained sample window.
    pub fn sample_window(&self) -> Vec<VitalSample> {
        self.buffer.snapshot()
    }

    /// Recent alerts, newest first.
    pub fn recent_alerts(&self) -> Vec<AlertEvent> {
        self.alerts.iter().cloned().collect()
    }

    /// The terminal summary, present once `Completed`.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bioproto::SessionType;

    fn controller(duration_secs: u32) -> SessionController {
        let config = SessionConfig::tens().with_duration(duration_secs);
        SessionController::from_seed(config, &PatchConfig::default(), 42).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let controller = controller(300);
        let state = controller.state();
        assert_eq!(state.phase, SessionPhase::Idle);
        assert_eq!(state.elapsed_secs, 0);
        assert!(state.started_at.is_none());
        assert_eq!(state.battery_pct, 85.0);
        assert!(controller.latest_sample().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SessionConfig::tens().with_duration(0);
        let err = SessionController::new(config, &PatchConfig::default());
        assert!(matches!(err, Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn test_start_only_from_idle() {
        let mut c = controller(300);
        c.start().unwrap();
        assert!(matches!(
            c.start(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_elapsed_increments_by_one_per_tick() {
        let mut c = controller(300);
        c.start().unwrap();
        for expected in 1..=20 {
            assert!(matches!(c.tick(), TickOutcome::Advanced));
            assert_eq!(c.state().elapsed_secs, expected);
        }
    }

    #[test]
    fn test_tick_outside_running_is_skipped() {
        let mut c = controller(300);
        assert!(matches!(c.tick(), TickOutcome::Skipped));

        c.start().unwrap();
        c.toggle_pause().unwrap();
        assert!(matches!(c.tick(), TickOutcome::Skipped));
        assert_eq!(c.state().elapsed_secs, 0);
    }

    #[test]
    fn test_pause_resume_preserves_elapsed() {
        let mut c = controller(300);
        c.start().unwrap();
        for _ in 0..5 {
            c.tick();
        }
        assert_eq!(c.toggle_pause().unwrap(), SessionPhase::Paused);
        c.tick();
        c.tick();
        assert_eq!(c.state().elapsed_secs, 5);

        assert_eq!(c.toggle_pause().unwrap(), SessionPhase::Running);
        c.tick();
        assert_eq!(c.state().elapsed_secs, 6);
    }

    #[test]
    fn test_toggle_pause_invalid_from_idle_and_completed() {
        let mut c = controller(300);
        assert!(matches!(
            c.toggle_pause(),
            Err(SessionError::InvalidTransition { .. })
        ));

        c.start().unwrap();
        c.stop().unwrap();
        assert!(matches!(
            c.toggle_pause(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_auto_completion_at_target() {
        let mut c = controller(5);
        c.start().unwrap();
        for _ in 0..4 {
            assert!(matches!(c.tick(), TickOutcome::Advanced));
        }
        match c.tick() {
            TickOutcome::Completed(summary) => {
                assert_eq!(summary.total_duration_secs, 5);
                assert_eq!(summary.session_type, SessionType::Tens);
                assert!(summary.average_vitals.is_some());
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(c.phase(), SessionPhase::Completed);
        // Never past the target.
        assert_eq!(c.state().elapsed_secs, 5);

        // Further ticks do nothing.
        assert!(matches!(c.tick(), TickOutcome::Skipped));
        assert_eq!(c.state().elapsed_secs, 5);
    }

    #[test]
    fn test_stop_from_paused() {
        let mut c = controller(300);
        c.start().unwrap();
        c.tick();
        c.toggle_pause().unwrap();

        let summary = c.stop().unwrap();
        assert_eq!(summary.total_duration_secs, 1);
        assert_eq!(c.phase(), SessionPhase::Completed);
    }

    #[test]
    fn test_stop_twice_is_invalid() {
        let mut c = controller(300);
        c.start().unwrap();
        c.tick();
        c.stop().unwrap();
        assert!(matches!(
            c.stop(),
            Err(SessionError::InvalidTransition { .. })
        ));
        // Still exactly one retained summary.
        assert!(c.summary().is_some());
    }

    #[test]
    fn test_stop_before_start_is_invalid() {
        let mut c = controller(300);
        assert!(matches!(
            c.stop(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_stop_with_empty_buffer_has_no_averages() {
        let mut c = controller(300);
        c.start().unwrap();
        let summary = c.stop().unwrap();
        assert_eq!(summary.total_duration_secs, 0);
        assert!(summary.average_vitals.is_none());
    }

    #[test]
    fn test_battery_drains_monotonically() {
        let mut c = controller(300);
        c.start().unwrap();
        let mut previous = c.state().battery_pct;
        for _ in 0..50 {
            c.tick();
            let level = c.state().battery_pct;
            assert!(level <= previous);
            assert!(level >= 0.0);
            previous = level;
        }
    }

    #[test]
    fn test_buffer_window_bounded() {
        let mut c = controller(300);
        c.start().unwrap();
        for _ in 0..50 {
            c.tick();
        }
        let window = c.sample_window();
        assert_eq!(window.len(), 20);
        for pair in window.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_recent_alerts_capped_and_newest_first() {
        // Force an alert every tick via an impossible heart-rate limit.
        let mut patch = PatchConfig::default();
        patch.thresholds.max_heart_rate_bpm = 0.0;
        let config = SessionConfig::tens().with_duration(300);
        let mut c = SessionController::from_seed(config, &patch, 7).unwrap();

        c.start().unwrap();
        for _ in 0..20 {
            c.tick();
        }
        let alerts = c.recent_alerts();
        assert_eq!(alerts.len(), 5);
        for pair in alerts.windows(2) {
            assert!(pair[0].id > pair[1].id, "alerts not newest-first");
        }
    }

    #[test]
    fn test_seeded_sessions_replay() {
        let run = || {
            let mut c = controller(60);
            c.start().unwrap();
            for _ in 0..60 {
                c.tick();
            }
            c.summary().unwrap().average_vitals.clone()
        };
        assert_eq!(run(), run());
    }
}
