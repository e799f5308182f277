//! Cooperative cancellation shared across a master or server query.
//!
//! Generalizes this workspace's `Arc<AtomicBool>` cancel-flag pattern used
//! by the background download manager, adding a [`tokio::sync::Notify`]
//! so waiters in a receive loop block on the flag instead of busy-polling
//! it inside a `select!`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cheaply-cloneable handle; cancelling any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves as soon as [`CancelToken::cancel`] is called, or
    /// immediately if it already has been. Intended for use as one arm of
    /// `tokio::select!` alongside a socket read or a timeout sleep.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.inner.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_resolves_immediately_if_already_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(50), token.cancelled())
            .await
            .expect("cancelled() should resolve without waiting");
    }

    #[tokio::test]
    async fn cancelled_resolves_once_cancel_is_called() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(100), handle)
            .await
            .expect("task should finish")
            .expect("task should not panic");
    }

    #[test]
    fn clones_share_cancellation_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
