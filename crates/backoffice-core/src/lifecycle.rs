//! Cooperative cancellation for host-bound async work.
//!
//! Every suspend point in a workspace operation races against the owning
//! host's [`LifecycleToken`]. Once the token fires, the operation must not
//! touch state it no longer owns.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

/// Cooperative cancellation token.
#[async_trait]
pub trait CancellationToken: Send + Sync {
    /// Resolves when cancellation is requested.
    async fn cancelled(&self);

    /// Non-blocking cancellation check.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Cancellation token that never triggers.
pub struct NeverCancel;

#[async_trait]
impl CancellationToken for NeverCancel {
    async fn cancelled(&self) {
        std::future::pending::<()>().await;
    }
}

/// Cancellation signal owned by a host or workspace.
///
/// Clones share the same signal. Cancelling is permanent and idempotent.
#[derive(Clone, Debug)]
pub struct LifecycleToken {
    signal: Arc<watch::Sender<bool>>,
}

impl LifecycleToken {
    /// Create a live (not cancelled) token.
    pub fn new() -> Self {
        let (signal, _rx) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
        }
    }

    /// Request cancellation. Returns `true` on the first call only.
    pub fn cancel(&self) -> bool {
        let was_cancelled = self.signal.send_replace(true);
        !was_cancelled
    }

    /// Run `fut` unless the token fires first.
    ///
    /// Returns `None` when cancelled, in which case `fut` is dropped at its
    /// current suspension point.
    pub async fn run_until_cancelled<F>(&self, fut: F) -> Option<F::Output>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.wait() => None,
            output = fut => Some(output),
        }
    }

    async fn wait(&self) {
        let mut rx = self.signal.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // The sender lives as long as any clone of this token.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for LifecycleToken {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CancellationToken for LifecycleToken {
    async fn cancelled(&self) {
        self.wait().await;
    }

    fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent() {
        let token = LifecycleToken::new();
        assert!(!token.is_cancelled());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_clones_share_signal() {
        let token = LifecycleToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_until_cancelled_completes() {
        let token = LifecycleToken::new();
        let out = token.run_until_cancelled(async { 7 }).await;
        assert_eq!(out, Some(7));
    }

    #[tokio::test]
    async fn test_run_until_cancelled_aborts_pending_future() {
        let token = LifecycleToken::new();
        let canceller = token.clone();
        let pending = token.run_until_cancelled(std::future::pending::<()>());
        canceller.cancel();
        assert_eq!(pending.await, None);
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let token = LifecycleToken::new();
        token.cancel();
        token.cancelled().await;
        assert!(token.is_cancelled());
    }
}
