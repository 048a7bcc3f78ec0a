//! Cancellation token for in-flight IPC calls.
//!
//! Shell hosts sometimes need to abandon a call that is stuck on a wedged
//! core (for example when Explorer tears down a menu handler). A token is
//! shared between the host and the client; cancelling it aborts the current
//! exchange with an `Interrupted` IO error and drops the connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cancellation token for cooperative cancellation of IPC calls.
///
/// This token can be cloned and shared across threads. When `cancel()` is
/// called on any clone, all clones observe the cancellation and every task
/// waiting in [`CancellationToken::cancelled`] wakes up.
///
/// # Example
///
/// ```
/// use crosscloud_ipc::cancel::CancellationToken;
///
/// let token = CancellationToken::new();
/// let host_side = token.clone();
///
/// host_side.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Create a new cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake all waiters.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Reset the token so the client can be used again after a cancel.
    pub fn reset(&self) {
        self.inner.cancelled.store(false, Ordering::SeqCst);
    }

    /// Wait until the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent cancel() is not lost.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Error returned when an operation is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelledError;

impl std::fmt::Display for CancelledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Operation was cancelled")
    }
}

impl std::error::Error for CancelledError {}

impl From<CancelledError> for crate::error::IpcError {
    fn from(err: CancelledError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Interrupted, err).into()
    }
}
