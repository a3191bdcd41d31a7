//! Cancellable voice control loops

mod destination;
mod home;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

pub use destination::DestinationLoop;
pub use home::HomeControlLoop;

/// States a voice control loop moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Prompting,
    Listening,
    Dispatching,
    Stopped,
}

/// Cooperative cancellation for voice loops
///
/// Cloneable; all clones observe the same flag. `cancel` is idempotent.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; safe to call any number of times
    pub fn cancel(&self) {
        if !self.inner.flag.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolve when cancellation is requested
    pub async fn cancelled(&self) {
        loop {
            // Register before re-checking so a concurrent cancel isn't missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration`, waking early on cancellation
    ///
    /// Returns true if the full duration elapsed, false if cancelled.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            () = self.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}

/// Log a loop state transition
fn transition(loop_name: &str, state: LoopState) {
    tracing::debug!(loop_name, state = ?state, "loop state");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_is_idempotent_and_observable() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());

        // Already-cancelled tokens resolve immediately
        token.cancelled().await;
    }

    #[tokio::test]
    async fn cancelled_wakes_a_waiting_task() {
        let token = CancelToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move {
                token.cancelled().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn sleep_cuts_short_on_cancel() {
        let token = CancelToken::new();
        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                token.cancel();
            })
        };

        let start = std::time::Instant::now();
        let completed = token.sleep(Duration::from_secs(30)).await;

        assert!(!completed);
        assert!(start.elapsed() < Duration::from_secs(1));
        canceller.await.unwrap();
    }
}
