//! Bounded, cancellable navigation
//!
//! Every page load races a timeout and the run's cancel token, so an abort
//! path can be driven deterministically in tests.

use std::time::Duration;
use tokio::sync::watch;

use crate::render::{PageRenderer, WaitPolicy};
use crate::utils::error::NavigationError;

/// Sending half of a cancel signal
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Receiving half of a cancel signal, cheap to clone
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelHandle {
    pub fn new() -> (Self, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelToken { rx })
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the token is cancelled; pends forever if it never is
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Navigate with a deadline, giving up early if `cancel` fires
pub async fn navigate_bounded<R>(
    renderer: &mut R,
    url: &str,
    wait: WaitPolicy,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<(), NavigationError>
where
    R: PageRenderer + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(NavigationError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(url = %url, "Navigation cancelled");
            Err(NavigationError::Cancelled)
        }
        outcome = tokio::time::timeout(timeout, renderer.navigate(url, wait)) => match outcome {
            Ok(result) => result,
            Err(_) => Err(NavigationError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_token_resolves() {
        let (handle, token) = CancelHandle::new();
        assert!(!token.is_cancelled());

        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });
        handle.cancel();

        waiter.await.unwrap();
        assert!(token.is_cancelled());
        assert!(handle.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_never_token_pends() {
        let token = CancelToken::never();
        let outcome =
            tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(outcome.is_err());
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_cancel() {
        let (handle, token) = CancelHandle::new();
        drop(handle);
        let outcome =
            tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(outcome.is_err());
    }
}
