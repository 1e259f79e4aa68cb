//! Coordinated shutdown signal
//!
//! A `Shutdown` is shared between the host and any number of clients. The
//! client never owns it: firing it is a request that the owning task answers
//! by calling `close()`, and `close()` fires it once more when the client has
//! terminated so everything waiting on `cancelled()` observes completion.
//!
//! ```ignore
//! let shutdown = Shutdown::new();
//! shutdown.spawn_signal_handler();
//!
//! let client = tether::builder()
//!     .url("wss://api.example.com/ws")
//!     .shutdown(shutdown.clone())
//!     .build()?;
//! client.connect().await?;
//! let receiver = client.spawn_receiver();
//!
//! shutdown.cancelled().await;
//! client.close().await;
//! let _ = receiver.await;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tracing::info;

#[derive(Debug)]
struct ShutdownInner {
    running: AtomicBool,
    notify: Notify,
}

/// Cloneable shutdown signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

impl Shutdown {
    /// Create a new signal in the running state
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ShutdownInner {
                running: AtomicBool::new(true),
                notify: Notify::new(),
            }),
        }
    }

    /// Fire the signal; later calls are no-ops
    pub fn cancel(&self) {
        if self.inner.running.swap(false, Ordering::AcqRel) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Check if the process should continue running
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub fn is_cancelled(&self) -> bool {
        !self.is_running()
    }

    /// Wait until the signal fires
    pub async fn cancelled(&self) {
        loop {
            // Registered before the flag check so a concurrent cancel is not missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for a duration, waking early if the signal fires
    ///
    /// Returns true when the full duration elapsed.
    pub async fn interruptible_sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => self.is_running(),
            _ = self.cancelled() => false,
        }
    }

    /// Spawn a Ctrl+C handler that fires the signal
    pub fn spawn_signal_handler(&self) {
        let shutdown = self.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal (Ctrl+C)");
                shutdown.cancel();
            }
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let shutdown = Shutdown::new();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.cancelled().await })
        };
        tokio::task::yield_now().await;
        assert!(shutdown.is_running());

        shutdown.cancel();
        waiter.await.unwrap();
        assert!(shutdown.is_cancelled());

        // Already fired: returns immediately and cancel stays idempotent
        shutdown.cancelled().await;
        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn interruptible_sleep_wakes_early() {
        let shutdown = Shutdown::new();
        assert!(shutdown.interruptible_sleep(Duration::from_millis(10)).await);

        let canceller = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                shutdown.cancel();
            })
        };
        let started = tokio::time::Instant::now();
        assert!(!shutdown.interruptible_sleep(Duration::from_secs(60)).await);
        assert!(started.elapsed() < Duration::from_secs(60));
        canceller.await.unwrap();
    }
}
