//! The async fetch discipline.
//!
//! Every screen fetch runs on the task substrate under a deadline and
//! reports back through the draw queue. The screen's `alive` flag is
//! cleared at `stop()`; a task observing it cleared discards its result
//! instead of posting, so teardown cannot be raced into visible state.

use crate::events::{ScreenId, ScreenMsg, UiSender};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use weft_provider::{ProviderError, ProviderResult};

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);
/// Histories may be large; they get a longer budget.
pub const HISTORY_DEADLINE: Duration = Duration::from_secs(30);
pub const BATCH_DEADLINE: Duration = Duration::from_secs(60);

/// Spawns `fut` with `deadline`, wrapping its outcome into a [`ScreenMsg`]
/// posted to screen `id`. Deadline expiry surfaces as a connection error.
pub fn spawn_fetch<T, Fut, W>(
    tx: &UiSender,
    id: ScreenId,
    alive: &Arc<AtomicBool>,
    deadline: Duration,
    fut: Fut,
    wrap: W,
) where
    T: Send + 'static,
    Fut: Future<Output = ProviderResult<T>> + Send + 'static,
    W: FnOnce(ProviderResult<T>) -> ScreenMsg + Send + 'static,
{
    let tx = tx.clone();
    let alive = Arc::clone(alive);
    tokio::spawn(async move {
        let result = match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::connection(format!(
                "deadline exceeded after {}s",
                deadline.as_secs()
            ))),
        };
        if alive.load(Ordering::Acquire) {
            tx.screen(id, wrap(result));
        }
    });
}

/// Periodic refresh driver. Posts [`ScreenMsg::RefreshTick`] to the
/// screen every `period` until the returned ticker (or the screen) dies.
/// The tick drives dispatch: the handler spawns the fetch, so the
/// rendering loop never awaits.
pub struct Ticker {
    running: Arc<AtomicBool>,
}

impl Ticker {
    pub fn spawn(
        tx: &UiSender,
        id: ScreenId,
        alive: &Arc<AtomicBool>,
        period: Duration,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let alive = Arc::clone(alive);
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick of a tokio interval is immediate; the screen
            // already fetched on start, so skip it.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !flag.load(Ordering::Acquire) || !alive.load(Ordering::Acquire) {
                    return;
                }
                tx.screen(id, ScreenMsg::RefreshTick);
            }
        });
        Self { running }
    }

    /// Idempotent and non-blocking.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One-shot delayed message, e.g. the 1.5s clipboard flash.
pub fn post_after(
    tx: &UiSender,
    id: ScreenId,
    alive: &Arc<AtomicBool>,
    delay: Duration,
    msg: ScreenMsg,
) {
    let tx = tx.clone();
    let alive = Arc::clone(alive);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if alive.load(Ordering::Acquire) {
            tx.screen(id, msg);
        }
    });
}
