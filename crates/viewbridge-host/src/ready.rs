//! One-shot readiness latch.

use std::sync::Arc;

use tokio::sync::watch;

/// Opens once when the webview reports `webview/didInitialize`.
#[derive(Debug, Clone)]
pub struct ReadyLatch {
    state: Arc<watch::Sender<bool>>,
}

impl ReadyLatch {
    /// A closed latch.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Open the latch. Returns `true` only for the call that opened it.
    pub fn open(&self) -> bool {
        self.state.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    /// Whether the latch is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.state.borrow()
    }

    /// Wait until the latch is open.
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for ReadyLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_opens_once() {
        let latch = ReadyLatch::new();
        assert!(!latch.is_open());
        assert!(latch.open());
        assert!(!latch.open());
        assert!(latch.is_open());
    }

    #[tokio::test]
    async fn test_waiters_release_on_open() {
        let latch = ReadyLatch::new();
        let waiter = tokio::spawn({
            let latch = latch.clone();
            async move { latch.wait().await }
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        latch.open();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_after_open_returns_immediately() {
        let latch = ReadyLatch::new();
        latch.open();
        tokio::time::timeout(Duration::from_millis(100), latch.wait())
            .await
            .unwrap();
    }
}
