//! Single-shot teardown of a group of host subscriptions.

use crate::host::Subscription;

/// Collects subscriptions so one call detaches all of them.
///
/// Cancelling runs at most once; subscriptions registered after the scope
/// is cancelled are detached immediately. Dropping the scope cancels it.
#[derive(Default)]
pub struct CancellationScope {
    subscriptions: Vec<Box<dyn Subscription>>,
    cancelled: bool,
}

impl CancellationScope {
    /// Create an empty, live scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tie a subscription to this scope.
    pub fn register(&mut self, mut subscription: Box<dyn Subscription>) {
        if self.cancelled {
            subscription.disconnect();
        } else {
            self.subscriptions.push(subscription);
        }
    }

    /// Detach every registered subscription. Later calls do nothing.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        for mut subscription in self.subscriptions.drain(..) {
            subscription.disconnect();
        }
    }

    /// Whether [`cancel`](Self::cancel) has run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether no subscriptions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl std::fmt::Debug for CancellationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationScope")
            .field("subscriptions", &self.subscriptions.len())
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

impl Drop for CancellationScope {
    fn drop(&mut self) {
        self.cancel();
    }
}
