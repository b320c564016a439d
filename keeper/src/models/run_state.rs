//! Per-session run state - counters, status line, transcript.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped outcome line in a session's transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// When the outcome was recorded.
    pub at: DateTime<Utc>,
    /// The outcome line, e.g. `200 HTTP/1.1 200 OK` or `ERROR: No response`.
    pub line: String,
}

impl std::fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.line)
    }
}

/// Observable state of a session's current (or most recent) run.
///
/// Shared between the controlling side and the one active scheduler; only
/// the active scheduler writes while a run is live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Replays completed in the current run. Reset to 0 only when a fresh
    /// run starts.
    pub sent_count: u64,
    /// Human-readable summary of the most recent outcome.
    pub last_status: String,
    /// Append-only log of per-tick outcomes. Cleared only when a new target
    /// request is loaded.
    pub transcript: Vec<TranscriptEntry>,
    /// Raw body of the most recent response, for the display pane.
    pub last_response: Option<Vec<u8>>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            sent_count: 0,
            last_status: "no run yet".to_string(),
            transcript: Vec::new(),
            last_response: None,
        }
    }
}

impl RunState {
    /// Set the status summary line.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.last_status = status.into();
    }

    /// Append a timestamped line to the transcript.
    pub fn log(&mut self, line: impl Into<String>) {
        self.transcript.push(TranscriptEntry {
            at: Utc::now(),
            line: line.into(),
        });
    }

    /// Reset counters for a fresh run. The transcript survives.
    pub fn begin_run(&mut self) {
        self.sent_count = 0;
    }

    /// Clear everything tied to the previous target. Called when a new
    /// capture is loaded into the session.
    pub fn reset_for_new_target(&mut self) {
        self.sent_count = 0;
        self.transcript.clear();
        self.last_response = None;
        self.last_status = "Request loaded.".to_string();
    }

    /// Drop the transcript only; counters and status survive.
    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }
}

/// Handle to a session's run state, shared between the controlling side and
/// the one active scheduler worker.
///
/// The lock is never held across an await point; a poisoned lock is
/// recovered rather than propagated so a panicking display thread cannot
/// wedge a session.
#[derive(Debug, Clone, Default)]
pub struct SharedRunState(Arc<Mutex<RunState>>);

impl SharedRunState {
    /// Run a closure against the state under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut RunState) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Clone out the current state for display.
    pub fn snapshot(&self) -> RunState {
        self.with(|state| state.clone())
    }

    /// The current status summary line.
    pub fn last_status(&self) -> String {
        self.with(|state| state.last_status.clone())
    }

    /// Replays completed in the current run.
    pub fn sent_count(&self) -> u64 {
        self.with(|state| state.sent_count)
    }
}
