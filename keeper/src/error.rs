//! Error types for keeper.
//!
//! Every failure is confined to the single affected session and surfaced as
//! a status string on it; none of these abort the process or touch other
//! sessions.

use thiserror::Error;

/// Invalid user input in the interval/max fields.
///
/// Never starts a run; fully recoverable by correcting the input and
/// starting again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The interval field did not parse as a positive integer.
    #[error("Invalid interval")]
    InvalidInterval(String),
    /// The max-requests field did not parse as a positive integer.
    #[error("Invalid max requests")]
    InvalidMaxRequests(String),
}

/// Why a session could not start a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    /// Start was attempted before any capture was loaded.
    #[error("No request loaded")]
    NoTargetLoaded,
    /// The session's configuration failed validation.
    #[error("{0}")]
    InvalidConfiguration(#[from] ConfigError),
}

/// A failure raised by the transport collaborator.
///
/// Fatal to the current run (never retried), recoverable by an explicit
/// re-start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// Human-readable description of what went wrong.
    pub message: String,
}

impl TransportError {
    /// Create a transport error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}
