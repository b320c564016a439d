//! Transport collaborator boundary.
//!
//! The core never owns HTTP semantics: it hands a session's raw request
//! bytes to a [`Transport`] and records whatever comes back. `Ok(None)` is
//! the recognized "no response" outcome; it is not an error and still counts
//! against the session's budget.

mod tcp;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::TargetRequest;

pub use tcp::TcpTransport;

/// Result of one replay: the status line plus the full raw response.
#[derive(Debug, Clone)]
pub struct ReplayResponse {
    /// Numeric status code parsed from the status line.
    pub status_code: u16,
    /// The first line of the response, e.g. `HTTP/1.1 200 OK`.
    pub status_line: String,
    /// The complete raw response bytes, for the display pane.
    pub raw: Vec<u8>,
}

impl ReplayResponse {
    /// Parse the status line out of raw response bytes.
    ///
    /// Only the first line is interpreted; the rest of the payload stays
    /// opaque. Fails if the second token is not a numeric status code.
    pub fn from_raw(raw: Vec<u8>) -> Result<Self, TransportError> {
        let head_end = raw.iter().position(|&b| b == b'\n').unwrap_or(raw.len());
        let status_line = String::from_utf8_lossy(&raw[..head_end])
            .trim_end()
            .to_string();
        let status_code = status_line
            .split_whitespace()
            .nth(1)
            .and_then(|token| token.parse::<u16>().ok())
            .ok_or_else(|| TransportError::new(format!("malformed status line: {status_line}")))?;
        Ok(Self {
            status_code,
            status_line,
            raw,
        })
    }
}

/// Issues one replay of a captured request against its original endpoint.
///
/// Implementations must pass the raw bytes through unmodified. A returned
/// error is fatal to the calling session's current run.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the target's raw bytes to its endpoint and wait for a response.
    ///
    /// Returns `Ok(None)` when the endpoint accepted the bytes but sent
    /// nothing back. There is no timeout here; an unresponsive endpoint
    /// blocks only the session worker that called it.
    async fn replay(&self, target: &TargetRequest)
        -> Result<Option<ReplayResponse>, TransportError>;
}
