//! Session configuration - replay cadence and request budget.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default replay interval when the operator has not set one.
pub const DEFAULT_INTERVAL_SECS: u64 = 10;

/// User-editable parameters for one session.
///
/// Edits and an active run are mutually exclusive: the owning session stops
/// its scheduler before accepting a new config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds between replays. Always >= 1.
    pub interval_secs: u64,
    /// Maximum number of replays before the session auto-stops.
    /// `None` means unlimited.
    pub max_requests: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            max_requests: None,
        }
    }
}

impl SessionConfig {
    /// Create a validated config.
    pub fn new(interval_secs: u64, max_requests: Option<u64>) -> Result<Self, ConfigError> {
        let config = Self {
            interval_secs,
            max_requests,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse the display layer's plain-text interval/max fields.
    ///
    /// An empty max field means unlimited; an empty interval field is
    /// invalid. Whitespace is trimmed on both.
    pub fn parse(interval: &str, max_requests: &str) -> Result<Self, ConfigError> {
        let interval_secs = interval
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidInterval(interval.trim().to_string()))?;

        let max_text = max_requests.trim();
        let max_requests = if max_text.is_empty() {
            None
        } else {
            Some(
                max_text
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidMaxRequests(max_text.to_string()))?,
            )
        };

        let config = Self {
            interval_secs,
            max_requests,
        };
        config.validate()?;
        Ok(config)
    }

    /// Re-check the numeric bounds. `start()` calls this so a config built
    /// by other means cannot bypass validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval("0".to_string()));
        }
        if self.max_requests == Some(0) {
            return Err(ConfigError::InvalidMaxRequests("0".to_string()));
        }
        Ok(())
    }
}
