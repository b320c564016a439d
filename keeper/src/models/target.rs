//! Target request model - the captured request a session replays.

use serde::{Deserialize, Serialize};

/// Scheme of the captured endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Convert scheme to its wire string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Parse a scheme from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }

    /// Default port for this scheme.
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable snapshot of a captured request and the endpoint to replay it
/// against.
///
/// A session's target is only ever replaced wholesale by loading a new
/// capture; it is never mutated field-by-field. The raw bytes are an opaque
/// payload handed unmodified to the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRequest {
    /// Raw request bytes, exactly as captured.
    pub raw: Vec<u8>,
    /// Destination host.
    pub host: String,
    /// Destination port.
    pub port: u16,
    /// Endpoint scheme.
    pub scheme: Scheme,
}

impl TargetRequest {
    /// Create a new target from a capture.
    pub fn new(raw: Vec<u8>, host: impl Into<String>, port: u16, scheme: Scheme) -> Self {
        Self {
            raw,
            host: host.into(),
            port,
            scheme,
        }
    }

    /// The `host:port` endpoint string, for status lines and logs.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
