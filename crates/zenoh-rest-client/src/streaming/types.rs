//! Cancellation and delivery types for subscriptions

use std::sync::Arc;

use tokio::sync::watch;

use crate::types::Sample;

/// Receives samples from an active subscription.
///
/// Invoked by the subscription's background task, one call per decoded
/// sample, in wire order. Implementations must be `Send` because delivery
/// happens off the subscriber's original call stack.
///
/// Blanket-implemented for closures, so
/// `client.subscribe(expr, token, |sample| { .. })` works directly.
pub trait SampleHandler: Send {
    /// Called once per sample, in the order frames arrived
    fn on_sample(&mut self, sample: Sample);
}

impl<F> SampleHandler for F
where
    F: FnMut(Sample) + Send,
{
    fn on_sample(&mut self, sample: Sample) {
        self(sample)
    }
}

/// Cancellation token for a subscription.
///
/// Cancelling the token is both necessary and sufficient to stop the stream
/// and release the underlying connection; there is no separate unsubscribe
/// call. Clones share the same cancellation state.
///
/// # Example
///
/// ```no_run
/// # use zenoh_rest_client::CancelToken;
/// let token = CancelToken::new();
/// let for_subscription = token.clone();
/// // ... pass `for_subscription` to subscribe() ...
/// token.cancel();
/// assert!(token.is_cancelled());
/// token.cancel(); // idempotent, no-op
/// ```
#[derive(Debug, Clone)]
pub struct CancelToken {
    // Arc keeps the sender alive as long as any clone exists, so
    // `cancelled()` can never observe a closed channel.
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create a new, uncancelled token
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Request cancellation. Idempotent; a second call has no effect.
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Completes once cancellation is requested.
    ///
    /// Completes immediately if the token is already cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();

        let handle = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_completes_immediately_when_already_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        token.cancelled().await;
    }

    #[test]
    fn test_unrelated_tokens_are_independent() {
        let a = CancelToken::new();
        let b = CancelToken::new();

        a.cancel();
        assert!(!b.is_cancelled());
    }
}
