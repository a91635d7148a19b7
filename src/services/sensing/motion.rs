//! Synthetic Motion Detector
//!
//! Stands in for an accelerometer: every sample interval it draws a batch of
//! linear-acceleration magnitudes, classifies each one, records the batch in
//! the motion history and pushes it to the sink.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sensing_cascade_core::{HistoryReader, MotionSource, SampleSink};

use crate::storage::MotionHistoryStore;

/// Readings per sample batch
const READINGS_PER_BATCH: usize = 3;

/// Label for a linear-acceleration magnitude in m/s², gravity removed
pub fn classify_magnitude(magnitude: f64) -> &'static str {
    if magnitude < 0.5 {
        "still"
    } else if magnitude < 3.0 {
        "walking"
    } else {
        "running"
    }
}

pub struct SyntheticMotionDetector {
    store: Arc<MotionHistoryStore>,
    interval: Duration,
    handle: Handle,
    seed: Option<u64>,
    active: Mutex<Option<CancellationToken>>,
}

impl SyntheticMotionDetector {
    pub fn new(store: Arc<MotionHistoryStore>, interval: Duration, handle: Handle) -> Self {
        Self {
            store,
            interval,
            handle,
            seed: None,
            active: Mutex::new(None),
        }
    }

    /// Deterministic readings
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn sample_batch(rng: &mut StdRng) -> Vec<String> {
    (0..READINGS_PER_BATCH)
        .map(|_| classify_magnitude(rng.gen_range(0.0..5.0)).to_string())
        .collect()
}

impl MotionSource for SyntheticMotionDetector {
    fn start_detection(&self, on_sample: SampleSink) {
        let token = CancellationToken::new();
        if let Some(previous) = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone())
        {
            previous.cancel();
        }

        let store = self.store.clone();
        let interval = self.interval;
        let seed = self.seed;
        self.handle.spawn(async move {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; samples start one interval in.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let motions = sample_batch(&mut rng);
                if let Err(e) = store.record(&motions) {
                    warn!(error = %e, "Failed to record motion batch");
                }
                if token.is_cancelled() {
                    break;
                }
                on_sample(&motions);
            }
            debug!("Motion sampling task finished");
        });
        debug!(interval_ms = interval.as_millis() as u64, "Motion detection started");
    }

    fn stop_detection(&self) {
        if let Some(token) = self.active.lock().unwrap_or_else(PoisonError::into_inner).take() {
            token.cancel();
            debug!("Motion detection stopped");
        }
    }

    fn history(&self) -> Option<String> {
        self.store.read_history()
    }

    fn clear_history(&self) -> bool {
        self.store.clear().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to clear motion history");
            false
        })
    }
}

impl Drop for SyntheticMotionDetector {
    fn drop(&mut self) {
        self.stop_detection();
    }
}
