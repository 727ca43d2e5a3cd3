//! Drop-to-unsubscribe handles.
//!
//! Stores hand one of these back from `subscribe`. The listener stays
//! registered for as long as the handle lives; dropping it runs the
//! store-provided teardown exactly once.

use std::fmt;

/// Keeps a listener registered until dropped.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap the teardown closure that removes the listener from its store.
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Keep the listener registered for the lifetime of the store.
    pub fn detach(mut self) {
        self.unsubscribe.take();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}
