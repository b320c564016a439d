//! Data models for keeper entities.

mod config;
mod run_state;
mod target;

pub use config::{SessionConfig, DEFAULT_INTERVAL_SECS};
pub use run_state::{RunState, SharedRunState, TranscriptEntry};
pub use target::{Scheme, TargetRequest};
