//! Resource Invariant Property Tests
//!
//! Random interleavings of start, stop, clock advances, sample pushes and
//! location completions. After every step at most one sensing resource is
//! live, and a stopped run never delivers another event.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tokio::sync::Notify;

use sensing_cascade_core::{CascadeConfig, MemoryPressure, Phase};

use super::support::{settle, EventLog, Harness, LocationBehavior};

#[derive(Debug, Clone)]
enum Op {
    Start,
    Stop,
    Advance(u64),
    Samples,
    FinishLocation,
    MemoryPressure,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Start),
        2 => Just(Op::Stop),
        4 => (0u64..12_000).prop_map(Op::Advance),
        2 => Just(Op::Samples),
        2 => Just(Op::FinishLocation),
        1 => Just(Op::MemoryPressure),
    ]
}

fn run_interleaving(ops: Vec<Op>) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();

    runtime.block_on(async move {
        let notify = Arc::new(Notify::new());
        let harness = Harness::new(LocationBehavior::Wait(notify.clone(), "office".into()));
        harness.motion_history.set("walking");
        let orchestrator = harness.orchestrator(CascadeConfig::default());
        let log = EventLog::default();
        // Event count at the last stop; nothing may arrive until the next start.
        let mut silent_at: Option<usize> = None;

        for op in ops {
            match op {
                Op::Start => {
                    silent_at = None;
                    orchestrator.start(log.callback());
                }
                Op::Stop => {
                    orchestrator.stop();
                    assert_eq!(orchestrator.current_phase(), Phase::None);
                    assert_eq!(harness.ledger().live(), 0);
                    silent_at = Some(log.len());
                }
                Op::Advance(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
                Op::Samples => harness.ledger().push_samples(&["walking", "still"]),
                Op::FinishLocation => notify.notify_waiters(),
                Op::MemoryPressure => orchestrator.on_memory_pressure(MemoryPressure::Low),
            }
            settle().await;

            assert!(
                harness.ledger().live() <= 1,
                "more than one resource live, last event: {}",
                last_event(&log)
            );
            assert!(harness.ledger().max_live() <= 1);
            if let Some(count) = silent_at {
                assert_eq!(log.len(), count, "event delivered after stop");
            }
            if !orchestrator.is_running() {
                assert_eq!(harness.ledger().live(), 0);
            }
        }

        orchestrator.stop();
        assert_eq!(harness.ledger().live(), 0);
    });
}

fn last_event(log: &EventLog) -> String {
    log.last().map(|e| e.to_string()).unwrap_or_default()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_at_most_one_resource(ops in prop::collection::vec(op(), 1..40)) {
        run_interleaving(ops);
    }
}

#[test]
fn test_rapid_start_stop_cycles() {
    let mut ops = Vec::new();
    for _ in 0..20 {
        ops.extend([Op::Start, Op::Samples, Op::Stop]);
    }
    ops.extend([Op::Start, Op::Advance(10_000), Op::FinishLocation]);
    run_interleaving(ops);
}
