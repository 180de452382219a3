//! RAII subscription guard.

use std::fmt;

/// Keeps an observer registered for as long as it is alive.
///
/// Dropping the guard, or calling [`unsubscribe`](Self::unsubscribe),
/// removes the observer before the next notification pass.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription that is already released.
    pub fn inert() -> Self {
        Self { release: None }
    }

    /// Bundle several subscriptions so they are released together.
    pub fn merge(subscriptions: Vec<Subscription>) -> Self {
        Self::new(move || drop(subscriptions))
    }

    /// Whether dropping this guard would still release an observer.
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Release the observer now.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
