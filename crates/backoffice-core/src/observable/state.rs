//! State<T> - A mutable value with push-based change notification
//!
//! `State<T>` wraps a value and notifies subscribers synchronously, in
//! subscription order, every time the value effectively changes. New
//! subscribers are called immediately with the current value (replay of one).
//!
//! # Locking
//!
//! The value and the observer list sit behind `parking_lot` locks that are
//! always taken in the same order (value, then observers) and are released
//! before any observer runs. Observers may therefore read or write any state,
//! including the one that is notifying them.
//!
//! # Completion
//!
//! After [`State::complete`] every mutation is a no-op returning `false`.
//! Reading the last value stays allowed.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use super::view::{Observable, ObservableSource};
use super::subscription::Subscription;

/// Shared value callback.
pub type NextFn<T> = Arc<dyn Fn(&T) + Send + Sync>;
/// Shared completion callback.
pub type CompleteFn = Arc<dyn Fn() + Send + Sync>;
type EqualityFn<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

struct ObserverEntry<T> {
    id: u64,
    next: NextFn<T>,
    complete: Option<CompleteFn>,
}

struct StateInner<T> {
    value: RwLock<T>,
    /// Incremented once per effective change.
    version: AtomicU64,
    observers: Mutex<Vec<ObserverEntry<T>>>,
    next_observer_id: AtomicU64,
    completed: AtomicBool,
    equality: EqualityFn<T>,
}

/// A reactive value container.
///
/// Cloning a `State` yields another handle to the same value. Owners keep the
/// `State` private and hand out [`Observable`] views via
/// [`State::as_observable`].
pub struct State<T> {
    inner: Arc<StateInner<T>>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> State<T> {
    /// Create a state that skips notifications for `PartialEq`-equal values.
    pub fn new(value: T) -> Self {
        Self::with_equality(value, |a, b| a == b)
    }
}

impl<T: Clone + Send + Sync + 'static> State<T> {
    /// Create a state with a custom equality policy.
    ///
    /// `equal(current, next)` returning `true` suppresses the update.
    pub fn with_equality(value: T, equal: impl Fn(&T, &T) -> bool + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(StateInner {
                value: RwLock::new(value),
                version: AtomicU64::new(0),
                observers: Mutex::new(Vec::new()),
                next_observer_id: AtomicU64::new(0),
                completed: AtomicBool::new(false),
                equality: Arc::new(equal),
            }),
        }
    }

    /// Create a state that notifies on every `set_value`, equal or not.
    pub fn always_notify(value: T) -> Self {
        Self::with_equality(value, |_, _| false)
    }

    /// Get a clone of the current value.
    pub fn get_value(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.read())
    }

    /// Number of effective changes since creation.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Whether [`complete`](Self::complete) has been called.
    pub fn is_completed(&self) -> bool {
        self.inner.completed.load(Ordering::Acquire)
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }

    /// Replace the value.
    ///
    /// Returns `true` if observers were notified.
    pub fn set_value(&self, next: T) -> bool {
        self.mutate(move |value| *value = next)
    }

    /// Apply a partial update to a copy of the value and store the result.
    ///
    /// Returns `true` if observers were notified.
    pub fn update(&self, patch: impl FnOnce(&mut T)) -> bool {
        self.mutate(patch)
    }

    /// Atomically apply `f` to a copy of the value.
    ///
    /// The closure runs under the write lock, so no other mutation can
    /// interleave between reading and storing. Its return value is passed
    /// through whether or not the value changed.
    pub fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> (R, bool) {
        if self.is_completed() {
            tracing::debug!("ignoring mutation of completed state");
            let mut scratch = self.get_value();
            return (f(&mut scratch), false);
        }

        let (output, notification) = {
            let mut guard = self.inner.value.write();
            let mut candidate = guard.clone();
            let output = f(&mut candidate);
            if (self.inner.equality)(&guard, &candidate) {
                (output, None)
            } else {
                let snapshot = candidate.clone();
                *guard = candidate;
                let version = self.inner.version.fetch_add(1, Ordering::AcqRel) + 1;
                let observers: Vec<NextFn<T>> = self
                    .inner
                    .observers
                    .lock()
                    .iter()
                    .map(|entry| Arc::clone(&entry.next))
                    .collect();
                (output, Some((snapshot, version, observers)))
            }
        };

        match notification {
            Some((snapshot, version, observers)) => {
                for observer in observers {
                    // An observer wrote a newer value, already delivered to
                    // everyone; this snapshot is stale.
                    if self.inner.version.load(Ordering::Acquire) != version {
                        break;
                    }
                    observer(&snapshot);
                }
                (output, true)
            }
            None => (output, false),
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut T)) -> bool {
        self.modify(f).1
    }

    /// Subscribe to value changes.
    ///
    /// `next` is called right away with the current value, then after every
    /// effective change. Dropping the returned [`Subscription`] unsubscribes.
    /// Subscribing to a completed state returns an inert subscription and
    /// does not call `next`.
    pub fn subscribe(&self, next: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.subscribe_entry(Arc::new(next), None)
    }

    /// Subscribe with an additional completion callback.
    pub fn subscribe_with_complete(
        &self,
        next: impl Fn(&T) + Send + Sync + 'static,
        complete: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe_entry(Arc::new(next), Some(Arc::new(complete)))
    }

    pub(crate) fn subscribe_entry(
        &self,
        next: NextFn<T>,
        complete: Option<CompleteFn>,
    ) -> Subscription {
        if self.is_completed() {
            if let Some(complete) = complete {
                complete();
            }
            return Subscription::inert();
        }

        let id = self.inner.next_observer_id.fetch_add(1, Ordering::Relaxed);
        let current = {
            let guard = self.inner.value.read();
            self.inner.observers.lock().push(ObserverEntry {
                id,
                next: Arc::clone(&next),
                complete,
            });
            guard.clone()
        };

        next(&current);

        let weak: Weak<StateInner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.observers.lock().retain(|entry| entry.id != id);
            }
        })
    }

    /// Complete the state: drop every observer and refuse further mutation.
    ///
    /// Idempotent. Completion callbacks run once, on the first call.
    pub fn complete(&self) {
        if self.inner.completed.swap(true, Ordering::AcqRel) {
            return;
        }
        let drained: Vec<ObserverEntry<T>> = std::mem::take(&mut *self.inner.observers.lock());
        tracing::trace!(observers = drained.len(), "state completed");
        for entry in drained {
            if let Some(complete) = entry.complete {
                complete();
            }
        }
    }

    /// Read-only view of this state.
    pub fn as_observable(&self) -> Observable<T> {
        Observable::from_source(Arc::new(self.clone()))
    }

    /// Read-only projection of this state.
    ///
    /// See [`Observable::as_observable_part`].
    pub fn as_observable_part<U>(
        &self,
        map: impl Fn(&T) -> U + Send + Sync + 'static,
    ) -> Observable<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
    {
        self.as_observable().as_observable_part(map)
    }

    pub(crate) fn downgrade(&self) -> WeakState<T> {
        WeakState {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> State<Option<T>> {
    /// Patch the contained value if there is one.
    ///
    /// Returns `false` without notifying when the state holds `None`.
    pub fn patch(&self, f: impl FnOnce(&mut T)) -> bool {
        self.mutate(|value| {
            if let Some(inner) = value.as_mut() {
                f(inner);
            }
        })
    }
}

impl<T: Clone + Send + Sync + 'static> ObservableSource<T> for State<T> {
    fn current(&self) -> T {
        self.get_value()
    }

    fn subscribe_source(&self, next: NextFn<T>, complete: Option<CompleteFn>) -> Subscription {
        self.subscribe_entry(next, complete)
    }

    fn is_completed(&self) -> bool {
        State::is_completed(self)
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &*self.inner.value.read())
            .field("version", &self.version())
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl<T: Clone + PartialEq + Send + Sync + Default + 'static> Default for State<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Non-owning handle used by derived projections to avoid reference cycles.
pub(crate) struct WeakState<T> {
    inner: Weak<StateInner<T>>,
}

impl<T> WeakState<T> {
    pub(crate) fn upgrade(&self) -> Option<State<T>> {
        self.inner.upgrade().map(|inner| State { inner })
    }
}

/// An object state; `update` applies shallow partial updates.
pub type ObjectState<T> = State<T>;

/// A boolean state.
pub type BooleanState = State<bool>;

/// A numeric state. `None` models an unset number.
pub type NumberState = State<Option<f64>>;

/// A string state.
pub type StringState = State<Option<String>>;

impl State<bool> {
    /// Flip the flag and return the new value.
    pub fn toggle(&self) -> bool {
        self.modify(|value| {
            *value = !*value;
            *value
        })
        .0
    }
}
