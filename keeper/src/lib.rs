//! Keeper - keep captured requests alive by replaying them on an interval.
//!
//! Each session is independent: its own target request, its own cadence and
//! budget, its own running/stopped state, its own transcript of outcomes.
//!
//! Architecture:
//! - [`models`] holds the data entities (target, config, run state)
//! - [`scheduler`] runs the countdown-and-replay loop, one tokio task per run
//! - [`session`] ties a target, a config, and at most one live scheduler
//! - [`registry`] owns all sessions and routes captures into fresh ones
//! - [`transport`] is the collaborator boundary that actually sends bytes
//! - [`cli`] is the thin display surface

pub mod cli;
pub mod error;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod transport;

pub use error::{ConfigError, StartError, TransportError};
pub use models::{RunState, Scheme, SessionConfig, TargetRequest};
pub use registry::SessionRegistry;
pub use scheduler::{KeepAliveScheduler, StopReason};
pub use session::Session;
pub use transport::{ReplayResponse, TcpTransport, Transport};
