//! The keep-alive scheduler - the countdown-and-replay loop for one run.
//!
//! Each run is one spawned tokio task owned by a [`KeepAliveScheduler`]
//! handle. The handle is single-use: a new run always means a new scheduler,
//! never a reused one. Cancellation is cooperative - a watch flag the worker
//! checks at least once per second while counting down - and the handle
//! keeps the task's `JoinHandle` so a stop can wait for the worker to have
//! truly exited instead of relying on a nulled reference.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::models::{SessionConfig, SharedRunState, TargetRequest};
use crate::transport::Transport;

/// Why a run reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` (or an implicit stop) cancelled the run.
    Cancelled,
    /// The configured max-requests budget was exhausted.
    BudgetExhausted,
    /// The transport raised a failure; the run ended immediately.
    TransportFailed,
}

impl StopReason {
    /// Stable label, used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::BudgetExhausted => "budget exhausted",
            Self::TransportFailed => "transport failed",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handle to one running replay loop.
///
/// Holds only clones of the shared run-state handle and its own channels;
/// it never owns the session. Dropping the handle without stopping leaves
/// the worker running detached, so owners stop before discarding.
pub struct KeepAliveScheduler {
    cancel_tx: watch::Sender<bool>,
    countdown_rx: watch::Receiver<u64>,
    handle: JoinHandle<StopReason>,
}

impl KeepAliveScheduler {
    /// Spawn the worker for one run.
    ///
    /// The caller validates the config and resets `sent_count` before
    /// spawning; the worker starts in the counting-down phase immediately.
    pub fn spawn(
        target: TargetRequest,
        config: SessionConfig,
        transport: Arc<dyn Transport>,
        run_state: SharedRunState,
    ) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (countdown_tx, countdown_rx) = watch::channel(config.interval_secs);

        let handle = tokio::spawn(run_loop(
            target,
            config,
            transport,
            run_state,
            cancel_rx,
            countdown_tx,
        ));

        Self {
            cancel_tx,
            countdown_rx,
            handle,
        }
    }

    /// Remaining seconds in the current countdown, updated once per second.
    pub fn countdown(&self) -> watch::Receiver<u64> {
        self.countdown_rx.clone()
    }

    /// Whether the worker is still running.
    ///
    /// This is the source of truth for a session's running indicator: it is
    /// a projection of the task's real lifecycle, not separately-held state.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal cancellation without waiting for the worker to exit.
    ///
    /// Observed within one second during a countdown. A replay already in
    /// flight is not aborted: its outcome is still recorded before the
    /// worker exits (deliberate policy, see DESIGN.md).
    pub fn request_stop(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Signal cancellation and wait for the worker to exit.
    pub async fn stop(self) -> StopReason {
        self.request_stop();
        self.join().await
    }

    /// Wait for the worker to reach its terminal state.
    pub async fn join(self) -> StopReason {
        // A panicked worker counts as cancelled; the run is over either way.
        self.handle.await.unwrap_or(StopReason::Cancelled)
    }
}

/// The countdown-and-replay loop.
async fn run_loop(
    target: TargetRequest,
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    run_state: SharedRunState,
    mut cancel_rx: watch::Receiver<bool>,
    countdown_tx: watch::Sender<u64>,
) -> StopReason {
    let endpoint = target.endpoint();
    let mut sent: u64 = 0;

    loop {
        // Counting-down phase. Surfaces the remaining seconds once per
        // second and must observe cancellation between any two of them;
        // once cancellation lands here, no replay is dispatched.
        for remaining in (1..=config.interval_secs).rev() {
            let _ = countdown_tx.send(remaining);
            tokio::select! {
                _ = cancel_rx.changed() => {
                    debug!(%endpoint, "cancelled during countdown");
                    return StopReason::Cancelled;
                }
                () = sleep(Duration::from_secs(1)) => {}
            }
        }
        let _ = countdown_tx.send(0);
        if *cancel_rx.borrow() {
            return StopReason::Cancelled;
        }

        // In-flight phase. A dispatched replay is never aborted; whatever
        // it returns is recorded even if stop() landed while waiting.
        match transport.replay(&target).await {
            Ok(Some(response)) => {
                sent += 1;
                debug!(%endpoint, code = response.status_code, sent, "replay ok");
                run_state.with(|state| {
                    state.sent_count = sent;
                    state.set_status(format!(
                        "Last: {} {} (Sent: {})",
                        response.status_code, response.status_line, sent
                    ));
                    state.log(format!("{} {}", response.status_code, response.status_line));
                    state.last_response = Some(response.raw);
                });
            }
            Ok(None) => {
                sent += 1;
                debug!(%endpoint, sent, "replay returned no response");
                run_state.with(|state| {
                    state.sent_count = sent;
                    state.set_status(format!("No response (Sent: {sent})"));
                    state.log("ERROR: No response");
                });
            }
            Err(err) => {
                debug!(%endpoint, error = %err, "replay failed, ending run");
                run_state.with(|state| {
                    state.set_status(format!("Error: {err}"));
                    state.log(format!("ERROR: {err}"));
                });
                return StopReason::TransportFailed;
            }
        }

        if let Some(max) = config.max_requests {
            if sent >= max {
                debug!(%endpoint, sent, "budget exhausted");
                run_state.with(|state| {
                    state.set_status(format!("Stopped after {sent} requests"));
                });
                return StopReason::BudgetExhausted;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scheme;
    use crate::transport::testing::{GateTransport, MockOutcome, MockTransport};
    use tokio::time::{advance, Instant};

    fn target() -> TargetRequest {
        TargetRequest::new(
            b"GET /ping HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec(),
            "example.com",
            80,
            Scheme::Http,
        )
    }

    fn config(interval_secs: u64, max_requests: Option<u64>) -> SessionConfig {
        SessionConfig::new(interval_secs, max_requests).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_stops_after_exact_count() {
        let transport = Arc::new(MockTransport::always_ok());
        let run_state = SharedRunState::default();
        let started = Instant::now();

        let scheduler = KeepAliveScheduler::spawn(
            target(),
            config(2, Some(3)),
            transport.clone(),
            run_state.clone(),
        );

        let reason = scheduler.join().await;
        assert_eq!(reason, StopReason::BudgetExhausted);
        assert_eq!(transport.calls(), 3);
        assert_eq!(run_state.sent_count(), 3);
        assert_eq!(run_state.last_status(), "Stopped after 3 requests");

        let state = run_state.snapshot();
        assert_eq!(state.transcript.len(), 3);
        assert!(state
            .transcript
            .iter()
            .all(|entry| entry.line == "200 HTTP/1.1 200 OK"));

        // Three ticks at 2s apart on the virtual clock.
        assert!(started.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_ends_run_without_retry() {
        let transport = Arc::new(MockTransport::sequence(
            vec![MockOutcome::Ok200, MockOutcome::Fail("connection refused")],
            MockOutcome::Ok200,
        ));
        let run_state = SharedRunState::default();

        let scheduler = KeepAliveScheduler::spawn(
            target(),
            config(5, None),
            transport.clone(),
            run_state.clone(),
        );

        let reason = scheduler.join().await;
        assert_eq!(reason, StopReason::TransportFailed);
        // Exactly two calls: the failing tick is the last one ever made.
        assert_eq!(transport.calls(), 2);
        assert_eq!(run_state.sent_count(), 1);
        assert_eq!(run_state.last_status(), "Error: connection refused");

        let state = run_state.snapshot();
        assert_eq!(
            state.transcript.last().unwrap().line,
            "ERROR: connection refused"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_response_still_counts_against_budget() {
        let transport = Arc::new(MockTransport::sequence(
            vec![MockOutcome::NoResponse],
            MockOutcome::Ok200,
        ));
        let run_state = SharedRunState::default();

        let scheduler = KeepAliveScheduler::spawn(
            target(),
            config(1, Some(1)),
            transport.clone(),
            run_state.clone(),
        );

        let reason = scheduler.join().await;
        assert_eq!(reason, StopReason::BudgetExhausted);
        assert_eq!(run_state.sent_count(), 1);
        assert_eq!(run_state.last_status(), "Stopped after 1 requests");
        assert_eq!(
            run_state.snapshot().transcript.last().unwrap().line,
            "ERROR: No response"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_countdown_prevents_dispatch() {
        let transport = Arc::new(MockTransport::always_ok());
        let run_state = SharedRunState::default();
        let started = Instant::now();

        let scheduler = KeepAliveScheduler::spawn(
            target(),
            config(10, None),
            transport.clone(),
            run_state.clone(),
        );

        // One second into a ten-second countdown.
        advance(Duration::from_secs(1)).await;
        let reason = scheduler.stop().await;

        assert_eq!(reason, StopReason::Cancelled);
        assert_eq!(transport.calls(), 0);
        assert_eq!(run_state.sent_count(), 0);
        // Cancellation landed well within one further tick.
        assert!(started.elapsed() <= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_is_surfaced_per_second() {
        let transport = Arc::new(MockTransport::always_ok());
        let run_state = SharedRunState::default();

        let scheduler = KeepAliveScheduler::spawn(
            target(),
            config(5, None),
            transport.clone(),
            run_state.clone(),
        );
        let countdown = scheduler.countdown();
        assert_eq!(*countdown.borrow(), 5);

        // Let the worker take its first poll before moving the clock.
        tokio::task::yield_now().await;
        advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(*countdown.borrow(), 4);

        advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(*countdown.borrow(), 3);

        let _ = scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_outcome_recorded_after_stop() {
        let transport = Arc::new(GateTransport::new());
        let run_state = SharedRunState::default();

        let scheduler = KeepAliveScheduler::spawn(
            target(),
            config(1, None),
            transport.clone(),
            run_state.clone(),
        );

        // Let the countdown elapse so the replay is dispatched and parked
        // on the gate.
        tokio::task::yield_now().await;
        advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(transport.calls(), 1);

        // Stop lands while the replay is in flight, then the replay
        // completes: its outcome is still recorded.
        scheduler.request_stop();
        transport.release();
        let reason = scheduler.join().await;

        assert_eq!(reason, StopReason::Cancelled);
        assert_eq!(run_state.sent_count(), 1);
        assert!(run_state.last_status().contains("(Sent: 1)"));
        // No second tick was ever started.
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_active_tracks_worker_lifecycle() {
        let transport = Arc::new(MockTransport::always_ok());
        let run_state = SharedRunState::default();

        let scheduler = KeepAliveScheduler::spawn(
            target(),
            config(1, Some(1)),
            transport,
            run_state,
        );
        assert!(scheduler.is_active());

        tokio::task::yield_now().await;
        advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.join().await, StopReason::BudgetExhausted);
    }
}
