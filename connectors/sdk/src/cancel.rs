//! Cooperative cancellation for long-running connector operations

use async_trait::async_trait;
use tokio::sync::watch;

/// Cooperative cancellation token.
///
/// Long-running operations (confirmation polling) race their work against
/// [`CancellationToken::cancelled`] and stop as soon as it resolves.
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
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

#[async_trait]
impl CancellationToken for NeverCancel {
    async fn cancelled(&self) {
        std::future::pending::<()>().await;
    }
}

/// Sending half of a shutdown channel
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Request cancellation of every token created from this handle
    pub fn cancel(&self) {
        // send_replace never fails, even with no receivers left
        self.tx.send_replace(true);
    }

    /// Create another token observing this handle
    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Token driven by a [`ShutdownHandle`]
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

#[async_trait]
impl CancellationToken for ShutdownToken {
    async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            // Handle dropped without cancelling: never resolve
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Create a linked handle/token pair
pub fn shutdown_channel() -> (ShutdownHandle, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownToken { rx })
}
