//! End-to-end session lifecycle over the tokio tick driver.
//!
//! These run with a paused tokio clock, so the 1-second tick loop is
//! exercised deterministically: `advance` delivers exactly the ticks a
//! real wall clock would have.

use std::sync::Arc;
use std::time::Duration;

use bioconf::PatchConfig;
use bioproto::{SessionConfig, SessionPhase, SessionType};
use stimgarden::{ChannelRecorder, SessionController, SessionRuntime};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::advance;

fn runtime_with(
    duration_secs: u32,
) -> (SessionRuntime, UnboundedReceiver<bioproto::SessionSummary>) {
    let patch = PatchConfig::default();
    let config = SessionConfig::tens().with_duration(duration_secs);
    let controller = SessionController::from_seed(config, &patch, 42).unwrap();
    let (recorder, summaries) = ChannelRecorder::new();
    let runtime = SessionRuntime::new(controller, &patch, Arc::new(recorder));
    (runtime, summaries)
}

/// Let spawned tasks run without advancing the clock.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Advance the paused clock by whole ticks, letting the ticker run.
async fn pass_seconds(n: u64) {
    for _ in 0..n {
        advance(Duration::from_secs(1)).await;
        settle().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_auto_completion_fires_summary_exactly_once() {
    let (runtime, mut summaries) = runtime_with(5);
    runtime.start().unwrap();

    // Blocking on the channel lets the paused clock auto-advance
    // through exactly the five ticks the session needs.
    let summary = summaries.recv().await.expect("summary on completion");
    assert_eq!(summary.total_duration_secs, 5);
    assert_eq!(summary.session_type, SessionType::Tens);
    assert!(summary.completed);
    assert!(summary.average_vitals.is_some());

    let state = runtime.state();
    assert_eq!(state.phase, SessionPhase::Completed);
    assert_eq!(state.elapsed_secs, 5);

    // No second summary, and stop() after completion is rejected.
    assert!(summaries.try_recv().is_err());
    assert!(runtime.stop().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_ticks_advance_elapsed_and_samples() {
    let (runtime, _summaries) = runtime_with(300);
    runtime.start().unwrap();
    settle().await;

    assert!(runtime.latest_sample().is_none());

    pass_seconds(3).await;
    let state = runtime.state();
    assert_eq!(state.phase, SessionPhase::Running);
    assert_eq!(state.elapsed_secs, 3);
    assert!(runtime.latest_sample().is_some());
    assert_eq!(runtime.sample_window().len(), 3);
    assert!(state.battery_pct < 85.0);
}

#[tokio::test(start_paused = true)]
async fn test_pause_suspends_sample_generation() {
    let (runtime, _summaries) = runtime_with(300);
    runtime.start().unwrap();
    settle().await;
    pass_seconds(3).await;

    assert_eq!(runtime.toggle_pause().unwrap(), SessionPhase::Paused);

    // Arbitrary wall time passes while paused; nothing moves.
    pass_seconds(30).await;
    assert_eq!(runtime.state().elapsed_secs, 3);
    assert_eq!(runtime.sample_window().len(), 3);

    // Resume continues from where it left off, no loss or duplication.
    assert_eq!(runtime.toggle_pause().unwrap(), SessionPhase::Running);
    settle().await;
    pass_seconds(2).await;
    assert_eq!(runtime.state().elapsed_secs, 5);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_timer_before_returning() {
    let (runtime, mut summaries) = runtime_with(300);
    runtime.start().unwrap();
    settle().await;
    pass_seconds(2).await;

    let summary = runtime.stop().unwrap();
    assert_eq!(summary.total_duration_secs, 2);
    assert_eq!(summaries.recv().await.unwrap().id, summary.id);

    // The timer is gone: wall time passing changes nothing.
    pass_seconds(10).await;
    let state = runtime.state();
    assert_eq!(state.phase, SessionPhase::Completed);
    assert_eq!(state.elapsed_secs, 2);
    assert!(summaries.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_second_stop_is_rejected_without_second_summary() {
    let (runtime, mut summaries) = runtime_with(300);
    runtime.start().unwrap();
    settle().await;
    pass_seconds(1).await;

    runtime.stop().unwrap();
    assert!(runtime.stop().is_err());

    assert!(summaries.recv().await.is_some());
    assert!(summaries.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_is_rejected() {
    let (runtime, _summaries) = runtime_with(300);
    runtime.start().unwrap();
    assert!(runtime.start().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_runtime_kills_the_ticker() {
    let (runtime, mut summaries) = runtime_with(5);
    runtime.start().unwrap();
    settle().await;
    pass_seconds(2).await;

    // Teardown without stop(): the timer must not outlive the runtime.
    drop(runtime);
    pass_seconds(10).await;

    // The session never reached its target, so no summary was recorded.
    assert!(summaries.try_recv().is_err());
}
