use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{TodoError, TodoResult};

/// Cooperative cancellation signal shared between a caller and the work it
/// started. Clones observe the same signal; once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `fut` unless `token` fires first.
///
/// A result that arrives after cancellation is discarded, so a stale response
/// can never overwrite newer state.
pub async fn cancellable<F, T>(token: &CancelToken, fut: F) -> TodoResult<T>
where
    F: Future<Output = TodoResult<T>>,
{
    if token.is_cancelled() {
        return Err(TodoError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(TodoError::Cancelled),
        result = fut => {
            if token.is_cancelled() {
                tracing::debug!("Discarding result that completed after cancellation");
                return Err(TodoError::Cancelled);
            }
            result
        }
    }
}
