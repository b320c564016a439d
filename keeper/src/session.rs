//! Session - one independent keep-alive unit.
//!
//! A session aggregates a captured target request, its replay configuration,
//! its run state, and at most one live [`KeepAliveScheduler`]. Everything
//! that could leave two schedulers writing the same run state funnels
//! through [`Session::retire_scheduler`], which waits for the previous
//! worker to actually exit before control returns.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::error::{ConfigError, StartError};
use crate::models::{RunState, SessionConfig, SharedRunState, TargetRequest, TranscriptEntry};
use crate::scheduler::KeepAliveScheduler;
use crate::transport::Transport;

/// One keep-alive session: a target request, its cadence and budget, and its
/// run history.
pub struct Session {
    id: Uuid,
    name: String,
    target: Option<TargetRequest>,
    config: SessionConfig,
    run_state: SharedRunState,
    scheduler: Option<KeepAliveScheduler>,
    transport: Arc<dyn Transport>,
}

/// Serializable snapshot of a session for the display layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub name: String,
    pub running: bool,
    pub sent_count: u64,
    pub last_status: String,
    pub transcript: Vec<TranscriptEntry>,
}

impl Session {
    /// Create an idle session with no target loaded.
    pub fn new(name: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            target: None,
            config: SessionConfig::default(),
            run_state: SharedRunState::default(),
            scheduler: None,
            transport,
        }
    }

    /// Stable internal identity, independent of the display name.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The loaded target, if any.
    pub const fn target(&self) -> Option<&TargetRequest> {
        self.target.as_ref()
    }

    /// Current configuration.
    pub const fn config(&self) -> SessionConfig {
        self.config
    }

    /// Whether a run is live right now. A pure projection of the scheduler
    /// task's lifecycle; never independently settable.
    pub fn is_running(&self) -> bool {
        self.scheduler
            .as_ref()
            .is_some_and(KeepAliveScheduler::is_active)
    }

    /// Remaining countdown seconds for the display, if a scheduler exists.
    pub fn countdown(&self) -> Option<watch::Receiver<u64>> {
        self.scheduler.as_ref().map(KeepAliveScheduler::countdown)
    }

    /// The current status summary line.
    pub fn last_status(&self) -> String {
        self.run_state.last_status()
    }

    /// Replays completed in the current run.
    pub fn sent_count(&self) -> u64 {
        self.run_state.sent_count()
    }

    /// Clone out the full run state for display.
    pub fn run_state(&self) -> RunState {
        self.run_state.snapshot()
    }

    /// Snapshot for listings and `--json` output.
    pub fn summary(&self) -> SessionSummary {
        let state = self.run_state.snapshot();
        SessionSummary {
            id: self.id,
            name: self.name.clone(),
            running: self.is_running(),
            sent_count: state.sent_count,
            last_status: state.last_status,
            transcript: state.transcript,
        }
    }

    /// Update the display name. Run state is untouched; empty names are
    /// ignored.
    pub fn rename(&mut self, new_name: &str) {
        let trimmed = new_name.trim();
        if !trimmed.is_empty() {
            self.name = trimmed.to_string();
        }
    }

    /// Replace the target wholesale with a newly captured request.
    ///
    /// Any in-progress run is invalidated: the scheduler is stopped first,
    /// then the transcript and response pane are cleared.
    pub async fn load_request(&mut self, target: TargetRequest) {
        self.retire_scheduler().await;
        info!(session = %self.name, endpoint = %target.endpoint(), "request loaded");
        self.target = Some(target);
        self.run_state.with(RunState::reset_for_new_target);
    }

    /// Apply the display layer's plain-text interval/max fields.
    ///
    /// Editing and an active run are mutually exclusive: any edit stops the
    /// scheduler before the new values are even parsed. Parse failures are
    /// surfaced on the session's status line.
    pub async fn apply_config_text(
        &mut self,
        interval: &str,
        max_requests: &str,
    ) -> Result<(), ConfigError> {
        self.retire_scheduler().await;
        match SessionConfig::parse(interval, max_requests) {
            Ok(config) => {
                self.config = config;
                Ok(())
            }
            Err(err) => {
                self.run_state.with(|state| state.set_status(err.to_string()));
                Err(err)
            }
        }
    }

    /// Replace the configuration with an already-validated one. Stops any
    /// active run first, same as a field edit.
    pub async fn set_config(&mut self, config: SessionConfig) -> Result<(), ConfigError> {
        self.retire_scheduler().await;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Start a fresh run.
    ///
    /// Fails without starting a loop when no target is loaded or the config
    /// is invalid; either failure is written to the status line. A previous
    /// scheduler is fully retired before the new one is created.
    pub async fn start(&mut self) -> Result<(), StartError> {
        let Some(target) = self.target.clone() else {
            let err = StartError::NoTargetLoaded;
            self.run_state.with(|state| state.set_status(err.to_string()));
            return Err(err);
        };
        if let Err(err) = self.config.validate() {
            self.run_state.with(|state| state.set_status(err.to_string()));
            return Err(err.into());
        }

        self.retire_scheduler().await;
        self.run_state.with(|state| {
            state.begin_run();
            state.set_status("Started");
        });
        info!(
            session = %self.name,
            interval = self.config.interval_secs,
            max = ?self.config.max_requests,
            "run started"
        );
        self.scheduler = Some(KeepAliveScheduler::spawn(
            target,
            self.config,
            Arc::clone(&self.transport),
            self.run_state.clone(),
        ));
        Ok(())
    }

    /// Stop the active run at the operator's request. No-op when idle.
    pub async fn stop(&mut self) {
        if self.scheduler.is_some() {
            self.retire_scheduler().await;
            self.run_state
                .with(|state| state.set_status("Stopped manually"));
        }
    }

    /// Stop the active run without touching the status line. Used for
    /// process-wide teardown; idempotent and safe on already-stopped
    /// sessions.
    pub async fn shutdown(&mut self) {
        self.retire_scheduler().await;
    }

    /// Clear the transcript only; counters and status survive.
    pub fn clear_transcript(&mut self) {
        self.run_state.with(RunState::clear_transcript);
    }

    /// Retire the current scheduler, waiting for its worker to exit, so no
    /// two schedulers ever write this session's run state concurrently.
    async fn retire_scheduler(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            let reason = scheduler.stop().await;
            info!(session = %self.name, %reason, "run retired");
        }
    }
}
