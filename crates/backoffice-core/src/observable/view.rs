//! Read-only observable views and derived projections.

use std::fmt;
use std::sync::Arc;

use super::state::{CompleteFn, NextFn, State};
use super::subscription::Subscription;

/// Anything an [`Observable`] can read from and subscribe to.
pub trait ObservableSource<T>: Send + Sync {
    /// Current value.
    fn current(&self) -> T;

    /// Register an observer. Must replay the current value to `next`.
    fn subscribe_source(&self, next: NextFn<T>, complete: Option<CompleteFn>) -> Subscription;

    /// Whether the source will never emit again.
    fn is_completed(&self) -> bool;
}

/// A read-only handle onto a [`State`] or onto a projection of one.
///
/// Observables carry no write surface. Projections created through
/// [`as_observable_part`](Self::as_observable_part) stay linked to their
/// source for as long as any clone of the projection is alive.
pub struct Observable<T> {
    source: Arc<dyn ObservableSource<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    pub(crate) fn from_source(source: Arc<dyn ObservableSource<T>>) -> Self {
        Self { source }
    }

    /// Get the current value.
    pub fn get_value(&self) -> T {
        self.source.current()
    }

    /// Subscribe with replay of the current value.
    pub fn subscribe(&self, next: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.source.subscribe_source(Arc::new(next), None)
    }

    /// Subscribe with an additional completion callback.
    pub fn subscribe_with_complete(
        &self,
        next: impl Fn(&T) + Send + Sync + 'static,
        complete: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        self.source
            .subscribe_source(Arc::new(next), Some(Arc::new(complete)))
    }

    /// Whether the underlying source has completed.
    pub fn is_completed(&self) -> bool {
        self.source.is_completed()
    }

    /// Derive a projection that re-emits only when the mapped value changes.
    ///
    /// `map` runs once per upstream emission. Completing the source completes
    /// the projection.
    pub fn as_observable_part<U>(&self, map: impl Fn(&T) -> U + Send + Sync + 'static) -> Observable<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
    {
        let target = State::new(map(&self.get_value()));
        self.derive(target, map)
    }

    /// Like [`as_observable_part`](Self::as_observable_part) with a custom
    /// equality policy for the mapped value.
    pub fn as_observable_part_with_equality<U>(
        &self,
        map: impl Fn(&T) -> U + Send + Sync + 'static,
        equal: impl Fn(&U, &U) -> bool + Send + Sync + 'static,
    ) -> Observable<U>
    where
        U: Clone + Send + Sync + 'static,
    {
        let target = State::with_equality(map(&self.get_value()), equal);
        self.derive(target, map)
    }

    fn derive<U>(&self, target: State<U>, map: impl Fn(&T) -> U + Send + Sync + 'static) -> Observable<U>
    where
        U: Clone + Send + Sync + 'static,
    {
        let on_next = target.downgrade();
        let on_complete = target.downgrade();
        let link = self.source.subscribe_source(
            Arc::new(move |value: &T| {
                if let Some(target) = on_next.upgrade() {
                    target.set_value(map(value));
                }
            }),
            Some(Arc::new(move || {
                if let Some(target) = on_complete.upgrade() {
                    target.complete();
                }
            })),
        );
        Observable::from_source(Arc::new(DerivedSource {
            target,
            _link: link,
        }))
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.get_value())
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// Backing store of a projection: the mapped state plus the upstream link.
struct DerivedSource<U> {
    target: State<U>,
    _link: Subscription,
}

impl<U: Clone + Send + Sync + 'static> ObservableSource<U> for DerivedSource<U> {
    fn current(&self) -> U {
        self.target.get_value()
    }

    fn subscribe_source(&self, next: NextFn<U>, complete: Option<CompleteFn>) -> Subscription {
        self.target.subscribe_entry(next, complete)
    }

    fn is_completed(&self) -> bool {
        self.target.is_completed()
    }
}

/// Tuples of observables that can be combined into one.
pub trait MultipleObservables {
    /// Tuple of the combined values.
    type Output;

    /// Combine into one observable that re-emits when any member changes.
    fn combine(self) -> Observable<Self::Output>;
}

/// Combine two or more observables into a tuple observable.
///
/// The result emits the full tuple whenever any member changes.
pub fn observe_multiple<M: MultipleObservables>(sources: M) -> Observable<M::Output> {
    sources.combine()
}

macro_rules! impl_multiple_observables {
    ($($name:ident : $ty:ident),+) => {
        impl<$($ty),+> MultipleObservables for ($(Observable<$ty>,)+)
        where
            $($ty: Clone + PartialEq + Send + Sync + 'static),+
        {
            type Output = ($($ty,)+);

            fn combine(self) -> Observable<Self::Output> {
                let ($($name,)+) = self;
                let read: Arc<dyn Fn() -> Self::Output + Send + Sync> = {
                    $(let $name = $name.clone();)+
                    Arc::new(move || ($($name.get_value(),)+))
                };
                let target = State::new(read());
                let mut links = Vec::new();
                $(
                    {
                        let weak = target.downgrade();
                        let read = Arc::clone(&read);
                        links.push($name.subscribe(move |_| {
                            if let Some(target) = weak.upgrade() {
                                target.set_value(read());
                            }
                        }));
                    }
                )+
                Observable::from_source(Arc::new(DerivedSource {
                    target,
                    _link: Subscription::merge(links),
                }))
            }
        }
    };
}

impl_multiple_observables!(a: A, b: B);
impl_multiple_observables!(a: A, b: B, c: C);
impl_multiple_observables!(a: A, b: B, c: C, d: D);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Clone, PartialEq, Debug)]
    struct Doc {
        name: String,
        sort: u32,
    }

    #[test]
    fn test_part_reemits_only_on_mapped_change() {
        let state = State::new(Doc {
            name: "Doc".into(),
            sort: 0,
        });
        let name = state.as_observable_part(|d| d.name.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = name.subscribe(move |n| sink.lock().push(n.clone()));

        state.update(|d| d.sort = 4);
        state.update(|d| d.name = "Renamed".into());

        assert_eq!(*seen.lock(), vec!["Doc".to_string(), "Renamed".to_string()]);
        assert_eq!(name.get_value(), "Renamed");
    }

    #[test]
    fn test_part_custom_equality() {
        let state = State::new(10_i32);
        let sign = state.as_observable().as_observable_part_with_equality(|v| *v, |a, b| a.signum() == b.signum());
        state.set_value(20);
        assert_eq!(sign.get_value(), 10);
        state.set_value(-1);
        assert_eq!(sign.get_value(), -1);
    }

    #[test]
    fn test_dropping_part_releases_upstream_link() {
        let state = State::new(1);
        let part = state.as_observable_part(|v| v * 2);
        assert_eq!(state.observer_count(), 1);
        drop(part);
        assert_eq!(state.observer_count(), 0);
    }

    #[test]
    fn test_part_completes_with_source() {
        let state = State::new(1);
        let part = state.as_observable_part(|v| v + 1);
        let done = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&done);
        let _sub = part.subscribe_with_complete(|_| {}, move || *flag.lock() = true);

        state.complete();
        assert!(*done.lock());
        assert!(part.is_completed());
        assert_eq!(part.get_value(), 2);
    }

    #[test]
    fn test_observe_multiple_tracks_all_members() {
        let columns = State::new(12_u32);
        let span = State::new(Some(6_u32));
        let combined = observe_multiple((columns.as_observable(), span.as_observable()));
        assert_eq!(combined.get_value(), (12, Some(6)));

        columns.set_value(8);
        assert_eq!(combined.get_value(), (8, Some(6)));
        span.set_value(None);
        assert_eq!(combined.get_value(), (8, None));
    }

    #[test]
    fn test_observe_multiple_four_members() {
        let a = State::new(1);
        let b = State::new("b".to_string());
        let c = State::new(false);
        let d = State::new(vec![1_u8]);
        let all = observe_multiple((
            a.as_observable(),
            b.as_observable(),
            c.as_observable(),
            d.as_observable(),
        ));
        c.set_value(true);
        assert_eq!(all.get_value(), (1, "b".to_string(), true, vec![1]));
    }
}
