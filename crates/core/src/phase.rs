//! Analysis Phases and Progress Events
//!
//! The cascade moves through `Motion → Location → Fusion → Complete`, with
//! `None` before a run starts and after every teardown. Callers observe the
//! run exclusively through [`ProgressEvent`]s.

use serde::{Deserialize, Serialize};

/// Phases of a sensing cascade run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No run in progress
    #[default]
    None,
    /// Motion sampling for a fixed duration
    Motion,
    /// One scan-and-infer location round trip
    Location,
    /// Fusion of motion and location context
    Fusion,
    /// Combined result delivered
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::None => write!(f, "none"),
            Phase::Motion => write!(f, "motion"),
            Phase::Location => write!(f, "location"),
            Phase::Fusion => write!(f, "fusion"),
            Phase::Complete => write!(f, "complete"),
        }
    }
}

impl Phase {
    /// Every phase in run order, starting with `None`
    pub const ALL: [Phase; 5] = [
        Phase::None,
        Phase::Motion,
        Phase::Location,
        Phase::Fusion,
        Phase::Complete,
    ];

    /// Parse phase from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Phase::None),
            "motion" => Some(Phase::Motion),
            "location" => Some(Phase::Location),
            "fusion" => Some(Phase::Fusion),
            "complete" => Some(Phase::Complete),
            _ => None,
        }
    }

    /// Position of this phase in [`Phase::ALL`]
    pub fn ordinal(self) -> u8 {
        match self {
            Phase::None => 0,
            Phase::Motion => 1,
            Phase::Location => 2,
            Phase::Fusion => 3,
            Phase::Complete => 4,
        }
    }

    /// Inverse of [`Phase::ordinal`]; unknown values map to `None`
    pub fn from_ordinal(value: u8) -> Self {
        Phase::ALL
            .get(value as usize)
            .copied()
            .unwrap_or(Phase::None)
    }
}

/// What a progress event means for the run that emitted it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    /// Phase entry or intermediate output
    Update,
    /// Informational, the run is unaffected (e.g. a re-entrant start)
    Notice,
    /// The run terminated with an error
    Failed,
    /// The run terminated successfully
    Completed,
}

/// A `(text, phase)` pair delivered to the caller's progress callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub text: String,
    pub phase: Phase,
    pub kind: ProgressKind,
}

impl ProgressEvent {
    pub fn update(text: impl Into<String>, phase: Phase) -> Self {
        Self {
            text: text.into(),
            phase,
            kind: ProgressKind::Update,
        }
    }

    pub fn notice(text: impl Into<String>, phase: Phase) -> Self {
        Self {
            text: text.into(),
            phase,
            kind: ProgressKind::Notice,
        }
    }

    pub fn failed(text: impl Into<String>, phase: Phase) -> Self {
        Self {
            text: text.into(),
            phase,
            kind: ProgressKind::Failed,
        }
    }

    pub fn completed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            phase: Phase::Complete,
            kind: ProgressKind::Completed,
        }
    }

    /// Whether this event ends the run that produced it
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, ProgressKind::Failed | ProgressKind::Completed)
    }
}

impl std::fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.phase, self.text)
    }
}
