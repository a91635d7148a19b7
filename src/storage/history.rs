//! Persisted Sensing History
//!
//! File-backed stores for the two durable outputs of a cascade run: the
//! bounded motion detection history and the last location analysis. Both are
//! read back by the fusion stage and the result aggregator.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use sensing_cascade_core::HistoryReader;

use crate::utils::error::{AppError, AppResult};

const MOTION_HISTORY_FILE: &str = "motion_history.json";
const LOCATION_RESPONSE_FILE: &str = "location_response.txt";

/// One batch of motion labels as detected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionRecord {
    pub recorded_at: DateTime<Utc>,
    pub motions: Vec<String>,
}

/// Keeps the most recent `limit` motion detections in a JSON file
#[derive(Debug)]
pub struct MotionHistoryStore {
    path: PathBuf,
    limit: usize,
    lock: Mutex<()>,
}

impl MotionHistoryStore {
    pub fn new(dir: &Path, limit: usize) -> Self {
        Self {
            path: dir.join(MOTION_HISTORY_FILE),
            limit: limit.max(1),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a detection, dropping the oldest beyond the limit
    pub fn record(&self, motions: &[String]) -> AppResult<()> {
        let _guard = self.lock()?;
        let mut records = self.load()?;
        records.push(MotionRecord {
            recorded_at: Utc::now(),
            motions: motions.to_vec(),
        });
        if records.len() > self.limit {
            let excess = records.len() - self.limit;
            records.drain(..excess);
        }
        fs::write(&self.path, serde_json::to_string_pretty(&records)?)?;
        Ok(())
    }

    /// Detections oldest first
    pub fn records(&self) -> AppResult<Vec<MotionRecord>> {
        let _guard = self.lock()?;
        self.load()
    }

    /// Returns whether anything was removed
    pub fn clear(&self) -> AppResult<bool> {
        let _guard = self.lock()?;
        if !self.path.exists() {
            return Ok(false);
        }
        let had_records = !self.load()?.is_empty();
        fs::remove_file(&self.path)?;
        Ok(had_records)
    }

    /// One line per detection, `None` when nothing is recorded
    pub fn render(&self) -> AppResult<Option<String>> {
        let records = self.records()?;
        if records.is_empty() {
            return Ok(None);
        }
        let lines: Vec<String> = records
            .iter()
            .map(|r| format!("[{}] {}", r.recorded_at.format("%H:%M:%S"), r.motions.join(", ")))
            .collect();
        Ok(Some(lines.join("\n")))
    }

    fn load(&self) -> AppResult<Vec<MotionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| AppError::internal("motion history lock poisoned"))
    }
}

impl HistoryReader for MotionHistoryStore {
    fn read_history(&self) -> Option<String> {
        match self.render() {
            Ok(history) => history,
            Err(e) => {
                warn!("Failed to read motion history at {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// Remembers the most recent location analysis
#[derive(Debug)]
pub struct LocationResponseStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocationResponseStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(LOCATION_RESPONSE_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save_response(&self, response: &str) -> AppResult<()> {
        let _guard = self.lock()?;
        fs::write(&self.path, response)?;
        Ok(())
    }

    pub fn last_response(&self) -> AppResult<Option<String>> {
        let _guard = self.lock()?;
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path)?))
    }

    pub fn clear(&self) -> AppResult<bool> {
        let _guard = self.lock()?;
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| AppError::internal("location response lock poisoned"))
    }
}

impl HistoryReader for LocationResponseStore {
    fn read_history(&self) -> Option<String> {
        match self.last_response() {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to read location response at {}: {}", self.path.display(), e);
                None
            }
        }
    }
}
