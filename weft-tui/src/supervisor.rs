//! Connection supervisor: periodic liveness probe with exponential
//! backoff reconnection.
//!
//! Every probe interval the provider is probed under a short deadline.
//! On failure the status flips to Disconnected and, unless one is
//! already in flight, a reconnect attempt is spawned after the current
//! backoff; the backoff then doubles up to its cap. Any success resets
//! the backoff to its initial value. Status changes reach the UI only
//! through the draw queue.

use crate::events::{ConnectionStatus, UiSender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use weft_provider::Provider;

pub const CHECK_INTERVAL: Duration = Duration::from_secs(10);
pub const PROBE_DEADLINE: Duration = Duration::from_secs(5);
pub const RECONNECT_DEADLINE: Duration = Duration::from_secs(10);
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Pure backoff schedule: doubles on failure, capped, reset on success.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    current: Duration,
    initial: Duration,
    max: Duration,
}

impl BackoffSchedule {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { current: initial, initial, max }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    /// The delay for the next attempt; doubles the stored value.
    pub fn advance(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Handle used to stop the supervisor at shutdown. Pending sleeps
/// observe the signal promptly.
pub struct SupervisorHandle {
    shutdown: watch::Sender<bool>,
}

impl SupervisorHandle {
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}

struct Shared {
    /// Single-flight guard: at most one reconnect attempt at any time.
    reconnecting: AtomicBool,
    /// Shared with reconnect tasks; never held across an await.
    backoff: Mutex<BackoffSchedule>,
}

pub fn spawn_supervisor(provider: Arc<dyn Provider>, tx: UiSender) -> SupervisorHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shared = Arc::new(Shared {
        reconnecting: AtomicBool::new(false),
        backoff: Mutex::new(BackoffSchedule::new(INITIAL_BACKOFF, MAX_BACKOFF)),
    });

    tokio::spawn(run(provider, tx, shared, shutdown_rx));
    SupervisorHandle { shutdown: shutdown_tx }
}

impl Shared {
    fn with_backoff<R>(&self, f: impl FnOnce(&mut BackoffSchedule) -> R) -> R {
        let mut guard = self.backoff.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

async fn run(
    provider: Arc<dyn Provider>,
    tx: UiSender,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
) {
    let start = tokio::time::Instant::now() + CHECK_INTERVAL;
    let mut ticker = tokio::time::interval_at(start, CHECK_INTERVAL);

    loop {
        tokio::select! {
            _ = shutdown.changed() => return,
            _ = ticker.tick() => {}
        }

        let probe = tokio::time::timeout(PROBE_DEADLINE, provider.check_connection()).await;
        match probe {
            Ok(Ok(())) => {
                shared.with_backoff(BackoffSchedule::reset);
                tx.connection(ConnectionStatus::Connected);
            }
            _ => {
                tx.connection(ConnectionStatus::Disconnected);
                // Single-flight: only spawn when no attempt is running.
                if !shared.reconnecting.swap(true, Ordering::SeqCst) {
                    let delay = shared.with_backoff(BackoffSchedule::advance);

                    tokio::spawn(attempt_reconnect(
                        Arc::clone(&provider),
                        tx.clone(),
                        Arc::clone(&shared),
                        shutdown.clone(),
                        delay,
                    ));
                }
            }
        }
    }
}

async fn attempt_reconnect(
    provider: Arc<dyn Provider>,
    tx: UiSender,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
    delay: Duration,
) {
    tx.connection(ConnectionStatus::Reconnecting);

    tokio::select! {
        _ = shutdown.changed() => {
            shared.reconnecting.store(false, Ordering::SeqCst);
            return;
        }
        _ = tokio::time::sleep(delay) => {}
    }

    let outcome = tokio::time::timeout(RECONNECT_DEADLINE, provider.reconnect()).await;
    match outcome {
        Ok(Ok(())) => {
            shared.with_backoff(BackoffSchedule::reset);
            tx.connection(ConnectionStatus::Connected);
            tracing::info!("reconnected to server");
        }
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "reconnect attempt failed");
        }
        Err(_) => {
            tracing::warn!("reconnect attempt timed out");
        }
    }
    // Either way the next probe cycle may retry.
    shared.reconnecting.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_to_cap_and_resets() {
        let mut schedule = BackoffSchedule::new(INITIAL_BACKOFF, MAX_BACKOFF);
        assert_eq!(schedule.advance(), Duration::from_secs(2));
        assert_eq!(schedule.advance(), Duration::from_secs(4));
        assert_eq!(schedule.advance(), Duration::from_secs(8));
        assert_eq!(schedule.advance(), Duration::from_secs(16));
        assert_eq!(schedule.advance(), Duration::from_secs(30));
        assert_eq!(schedule.advance(), Duration::from_secs(30));

        schedule.reset();
        assert_eq!(schedule.current(), Duration::from_secs(2));
    }

    /// Sleep before the k-th attempt is min(B0 * 2^(k-1), Bmax).
    #[test]
    fn backoff_schedule_formula() {
        let mut schedule = BackoffSchedule::new(INITIAL_BACKOFF, MAX_BACKOFF);
        for k in 1u32..=8 {
            let expected = Duration::from_secs(2u64 << (k - 1)).min(MAX_BACKOFF);
            assert_eq!(schedule.advance(), expected, "attempt {k}");
        }
    }
}
