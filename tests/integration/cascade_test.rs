//! Phase Orchestrator Integration Tests
//!
//! Drives full runs against deterministic fakes on a paused tokio clock:
//! - Phase ordering and the combined result
//! - The motion timer
//! - Failure, cancellation and unavailable-host paths
//! - Re-entrant starts and resource accounting

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use sensing_cascade::services::cascade::{
    PhaseOrchestrator, ALREADY_IN_PROGRESS, CONTEXT_UNAVAILABLE, FUSION_STARTED, LOCATION_STARTED,
    MOTION_STARTED, NO_LOCATION_DATA,
};
use sensing_cascade_core::{CascadeConfig, MemoryPressure, Phase, ProgressKind};

use super::support::{settle, until, until_idle, EventLog, Harness, LocationBehavior};

const MOTION_MS: u64 = 10_000;

async fn finish_motion() {
    tokio::time::sleep(Duration::from_millis(MOTION_MS)).await;
    settle().await;
}

// ============================================================================
// Successful runs
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_success_order_and_combined_result() {
    let harness = Harness::answering("A university library");
    harness.motion_history.set("walking, running");
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    settle().await;
    harness.ledger().push_samples(&["walking", "running"]);
    finish_motion().await;
    until_idle(&orchestrator).await;

    assert_eq!(
        log.texts()[..4],
        [
            MOTION_STARTED.to_string(),
            "Detected motions: walking, running".to_string(),
            LOCATION_STARTED.to_string(),
            FUSION_STARTED.to_string(),
        ]
    );
    assert_eq!(
        log.phases(),
        vec![
            Phase::Motion,
            Phase::Motion,
            Phase::Location,
            Phase::Fusion,
            Phase::Fusion,
            Phase::Complete,
        ]
    );

    let fused = &log.events()[4];
    assert_eq!(fused.text, "Fused: walking, running @ A university library");

    let complete = log.last().unwrap();
    assert_eq!(complete.kind, ProgressKind::Completed);
    assert_eq!(
        complete.text,
        "=== Motion Analysis Results ===\nwalking, running\n\n=== Location Analysis Results ===\nA university library"
    );

    assert_eq!(orchestrator.current_phase(), Phase::None);
    assert!(!orchestrator.is_running());
    assert_eq!(harness.ledger().max_live(), 1);
    assert_eq!(harness.ledger().live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_location_starts_after_exactly_ten_seconds() {
    let notify = Arc::new(Notify::new());
    let harness = Harness::new(LocationBehavior::Wait(notify.clone(), "office".into()));
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    settle().await;
    tokio::time::sleep(Duration::from_millis(MOTION_MS - 1)).await;
    settle().await;

    assert_eq!(log.texts(), vec![MOTION_STARTED.to_string()]);
    assert_eq!(orchestrator.current_phase(), Phase::Motion);
    assert_eq!(harness.ledger().location_acquired(), 0);

    tokio::time::sleep(Duration::from_millis(1)).await;
    settle().await;

    let last = log.last().unwrap();
    assert_eq!(last.text, LOCATION_STARTED);
    assert_eq!(last.phase, Phase::Location);
    assert_eq!(orchestrator.current_phase(), Phase::Location);
    // motion released before location acquired
    assert_eq!(harness.ledger().live(), 1);
    assert_eq!(harness.ledger().max_live(), 1);

    orchestrator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_configured_motion_duration() {
    let harness = Harness::answering("home");
    let config = CascadeConfig::default().with_motion_duration(Duration::from_millis(250));
    let orchestrator = harness.orchestrator(config);
    let log = EventLog::default();

    orchestrator.start(log.callback());
    tokio::time::sleep(Duration::from_millis(250)).await;
    until_idle(&orchestrator).await;

    assert_eq!(log.last().unwrap().phase, Phase::Complete);
}

#[tokio::test(start_paused = true)]
async fn test_fusion_input_uses_sentinel_for_missing_location() {
    let harness = Harness::new(LocationBehavior::Unrecorded("unsaved".into()));
    harness.motion_history.set("walking,walking,running");
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    finish_motion().await;
    until_idle(&orchestrator).await;

    assert_eq!(
        harness.fusion.inputs(),
        vec![("walking,walking,running".to_string(), NO_LOCATION_DATA.to_string())]
    );
    let complete = log.last().unwrap();
    let location_section = "=== Location Analysis Results ===\nNo location data available";
    assert!(complete.text.ends_with(location_section));
}

#[tokio::test(start_paused = true)]
async fn test_fusion_input_keeps_most_recent_characters() {
    let harness = Harness::answering("library");
    let history = format!("{}{}", "a".repeat(100), "b".repeat(60));
    harness.motion_history.set(&history);
    let orchestrator = harness.orchestrator(CascadeConfig::default().with_fusion_history_chars(50));
    let log = EventLog::default();

    orchestrator.start(log.callback());
    finish_motion().await;
    until_idle(&orchestrator).await;

    let inputs = harness.fusion.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].0, "b".repeat(50));
    assert_eq!(inputs[0].1, "library");
}

#[tokio::test(start_paused = true)]
async fn test_runs_can_repeat_after_completion() {
    let harness = Harness::answering("cafe");
    let orchestrator = harness.orchestrator(CascadeConfig::default());

    for _ in 0..2 {
        let log = EventLog::default();
        orchestrator.start(log.callback());
        finish_motion().await;
        until_idle(&orchestrator).await;
        assert_eq!(log.last().unwrap().phase, Phase::Complete);
    }

    assert_eq!(harness.ledger().motion_acquired(), 2);
    assert_eq!(harness.ledger().location_acquired(), 2);
    assert_eq!(harness.ledger().max_live(), 1);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_location_failure_stops_the_cascade() {
    let harness = Harness::new(LocationBehavior::Fail("network down".into()));
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    finish_motion().await;

    let last = log.last().unwrap();
    assert_eq!(last.text, "Error in location analysis: network down");
    assert_eq!(last.phase, Phase::Location);
    assert_eq!(last.kind, ProgressKind::Failed);
    assert!(!log.phases().contains(&Phase::Fusion));
    assert!(!log.phases().contains(&Phase::Complete));
    assert!(harness.fusion.inputs().is_empty());

    assert_eq!(orchestrator.current_phase(), Phase::None);
    assert_eq!(harness.ledger().live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fusion_failure_reports_and_tears_down() {
    let harness = Harness::answering("park");
    harness.fusion.fail_with("model offline");
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    finish_motion().await;
    until_idle(&orchestrator).await;

    let last = log.last().unwrap();
    assert_eq!(last.text, "Error in context fusion: model offline");
    assert_eq!(last.phase, Phase::Fusion);
    assert!(!log.phases().contains(&Phase::Complete));
    assert_eq!(orchestrator.current_phase(), Phase::None);
    assert_eq!(harness.ledger().live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_host_before_start() {
    let harness = Harness::answering("nowhere");
    harness.host.detach();
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    settle().await;

    let events = log.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text, CONTEXT_UNAVAILABLE);
    assert_eq!(events[0].phase, Phase::None);
    assert_eq!(harness.ledger().motion_acquired(), 0);
    assert_eq!(orchestrator.current_phase(), Phase::None);
}

#[tokio::test(start_paused = true)]
async fn test_host_lost_during_motion() {
    let harness = Harness::answering("nowhere");
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    settle().await;
    harness.host.detach();
    finish_motion().await;

    let last = log.last().unwrap();
    assert_eq!(last.text, CONTEXT_UNAVAILABLE);
    assert_eq!(last.phase, Phase::None);
    assert_eq!(harness.ledger().location_acquired(), 0);
    assert_eq!(harness.ledger().live(), 0);
    assert!(!orchestrator.is_running());
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_without_run_is_a_noop() {
    let harness = Harness::answering("home");
    let orchestrator = harness.orchestrator(CascadeConfig::default());

    orchestrator.stop();

    assert_eq!(orchestrator.current_phase(), Phase::None);
    assert_eq!(harness.ledger().motion_acquired(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_motion_silences_the_run() {
    let harness = Harness::answering("home");
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    settle().await;
    harness.ledger().push_samples(&["still"]);
    orchestrator.stop();
    let delivered = log.len();

    assert_eq!(orchestrator.current_phase(), Phase::None);
    assert_eq!(harness.ledger().live(), 0);

    harness.ledger().push_samples(&["running"]);
    tokio::time::sleep(Duration::from_millis(MOTION_MS * 3)).await;
    settle().await;

    assert_eq!(log.len(), delivered);
    assert_eq!(harness.ledger().location_acquired(), 0);
    assert_eq!(orchestrator.current_phase(), Phase::None);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_location_discards_pending_result() {
    let notify = Arc::new(Notify::new());
    let harness = Harness::new(LocationBehavior::Wait(notify.clone(), "office".into()));
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    finish_motion().await;
    assert_eq!(orchestrator.current_phase(), Phase::Location);
    assert_eq!(harness.ledger().live(), 1);

    orchestrator.stop();
    let delivered = log.len();
    notify.notify_waiters();
    settle().await;

    assert_eq!(log.len(), delivered);
    assert_eq!(harness.ledger().live(), 0);
    assert!(harness.fusion.inputs().is_empty());
    assert_eq!(orchestrator.current_phase(), Phase::None);
}

#[tokio::test(start_paused = true)]
async fn test_stop_from_inside_the_callback() {
    let harness = Harness::answering("home");
    let orchestrator = Arc::new(harness.orchestrator(CascadeConfig::default()));
    let log = EventLog::default();

    let record = log.callback();
    let handle = Arc::downgrade(&orchestrator);
    orchestrator.start(move |event| {
        let stop_now = event.text == LOCATION_STARTED;
        record(event);
        if stop_now {
            if let Some(orchestrator) = handle.upgrade() {
                orchestrator.stop();
            }
        }
    });
    finish_motion().await;

    assert_eq!(log.last().unwrap().text, LOCATION_STARTED);
    assert_eq!(harness.ledger().location_acquired(), 0);
    assert_eq!(harness.ledger().live(), 0);
    assert_eq!(orchestrator.current_phase(), Phase::None);
}

#[tokio::test(start_paused = true)]
async fn test_error_callback_sees_no_active_run() {
    let harness = Harness::new(LocationBehavior::Fail("network down".into()));
    let orchestrator = Arc::new(harness.orchestrator(CascadeConfig::default()));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let observed = seen.clone();
    let handle = Arc::downgrade(&orchestrator);
    orchestrator.start(move |event| {
        if event.kind != ProgressKind::Failed {
            return;
        }
        if let Some(orchestrator) = handle.upgrade() {
            let state = (event.text, orchestrator.current_phase(), orchestrator.is_running());
            observed.lock().unwrap().push(state);
        }
    });
    finish_motion().await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(
            "Error in location analysis: network down".to_string(),
            Phase::None,
            false
        )]
    );
    assert_eq!(harness.ledger().live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_from_the_completion_callback_begins_a_new_run() {
    let harness = Harness::answering("cafe");
    let orchestrator = Arc::new(harness.orchestrator(CascadeConfig::default()));
    let first = EventLog::default();
    let second = EventLog::default();
    let phase_at_completion = Arc::new(Mutex::new(None));

    let record = first.callback();
    let follow_up = second.clone();
    let observed = phase_at_completion.clone();
    let handle = Arc::downgrade(&orchestrator);
    orchestrator.start(move |event| {
        let done = event.kind == ProgressKind::Completed;
        record(event);
        if !done {
            return;
        }
        if let Some(orchestrator) = handle.upgrade() {
            *observed.lock().unwrap() = Some(orchestrator.current_phase());
            orchestrator.start(follow_up.callback());
        }
    });
    finish_motion().await;
    until(|| second.len() > 0).await;

    assert_eq!(first.last().unwrap().kind, ProgressKind::Completed);
    assert_eq!(*phase_at_completion.lock().unwrap(), Some(Phase::None));
    assert_eq!(second.texts(), vec![MOTION_STARTED.to_string()]);
    assert!(!second.texts().contains(&ALREADY_IN_PROGRESS.to_string()));
    assert!(orchestrator.is_running());
    assert_eq!(orchestrator.current_phase(), Phase::Motion);
    assert_eq!(harness.ledger().motion_acquired(), 2);
    assert_eq!(harness.ledger().max_live(), 1);

    orchestrator.stop();
    assert_eq!(harness.ledger().live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_close_releases_and_blocks_new_runs() {
    let harness = Harness::answering("home");
    let orchestrator: PhaseOrchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    settle().await;
    orchestrator.close();
    assert_eq!(harness.ledger().live(), 0);

    let after = EventLog::default();
    orchestrator.start(after.callback());
    let events = after.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text, CONTEXT_UNAVAILABLE);
}

// ============================================================================
// Re-entrancy and memory pressure
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reentrant_start_reports_current_phase() {
    let notify = Arc::new(Notify::new());
    let harness = Harness::new(LocationBehavior::Wait(notify.clone(), "office".into()));
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let first = EventLog::default();

    orchestrator.start(first.callback());
    settle().await;

    let second = EventLog::default();
    orchestrator.start(second.callback());
    let events = second.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text, ALREADY_IN_PROGRESS);
    assert_eq!(events[0].phase, Phase::Motion);
    assert_eq!(events[0].kind, ProgressKind::Notice);

    finish_motion().await;
    let third = EventLog::default();
    orchestrator.start(third.callback());
    assert_eq!(third.events()[0].phase, Phase::Location);

    notify.notify_waiters();
    until_idle(&orchestrator).await;

    assert_eq!(first.last().unwrap().phase, Phase::Complete);
    assert_eq!(second.len(), 1);
    assert_eq!(third.len(), 1);
    assert_eq!(harness.ledger().motion_acquired(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_memory_pressure_keeps_the_run_going() {
    let harness = Harness::answering("gym");
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    settle().await;
    orchestrator.on_memory_pressure(MemoryPressure::Critical);

    assert_eq!(harness.ledger().trims(), 1);
    assert_eq!(orchestrator.current_phase(), Phase::Motion);

    finish_motion().await;
    until_idle(&orchestrator).await;
    assert_eq!(log.last().unwrap().phase, Phase::Complete);
}

#[tokio::test(start_paused = true)]
async fn test_blank_motion_history_counts_as_missing() {
    let harness = Harness::answering("gym");
    harness.motion_history.set("   ");
    let orchestrator = harness.orchestrator(CascadeConfig::default());
    let log = EventLog::default();

    orchestrator.start(log.callback());
    finish_motion().await;
    until_idle(&orchestrator).await;

    assert_eq!(harness.fusion.inputs()[0].0, "No motion data");
    assert!(log
        .last()
        .unwrap()
        .text
        .starts_with("=== Motion Analysis Results ===\nNo motion data available"));
}
