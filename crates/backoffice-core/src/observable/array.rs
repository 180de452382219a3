//! ArrayState<T, K> - an identity-keyed observable collection
//!
//! Every write goes through the [`frozen`](super::frozen) helpers, so keys
//! stay unique and untouched elements keep their position.

use std::fmt;
use std::sync::Arc;

use super::frozen::{
    append_many_to_frozen_array, append_to_frozen_array, push_to_unique_array,
    remove_from_frozen_array,
};
use super::state::State;
use super::subscription::Subscription;
use super::view::Observable;

type KeyFn<T, K> = Arc<dyn Fn(&T) -> K + Send + Sync>;

/// An observable vector whose elements are identified by an extracted key.
pub struct ArrayState<T, K> {
    state: State<Vec<T>>,
    key_of: KeyFn<T, K>,
}

impl<T, K> Clone for ArrayState<T, K> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            key_of: Arc::clone(&self.key_of),
        }
    }
}

impl<T, K> ArrayState<T, K>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    K: PartialEq + Send + Sync + 'static,
{
    /// Create a collection keyed by `key_of`.
    ///
    /// Duplicate keys in `initial` collapse onto the first position, with
    /// the last value winning.
    pub fn new(initial: Vec<T>, key_of: impl Fn(&T) -> K + Send + Sync + 'static) -> Self {
        let key_of: KeyFn<T, K> = Arc::new(key_of);
        let deduped = append_many_to_frozen_array(&[], initial, |item: &T| key_of(item));
        Self {
            state: State::new(deduped),
            key_of,
        }
    }

    /// Key of `item` under this collection's key function.
    pub fn key_of(&self, item: &T) -> K {
        (self.key_of)(item)
    }

    /// Snapshot of the whole collection.
    pub fn get_value(&self) -> Vec<T> {
        self.state.get_value()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.state.with(Vec::len)
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the whole collection.
    pub fn set_value(&self, items: Vec<T>) -> bool {
        let key_of = Arc::clone(&self.key_of);
        let deduped = append_many_to_frozen_array(&[], items, move |item: &T| key_of(item));
        self.state.set_value(deduped)
    }

    /// Append `item`, replacing in place when its key is already present.
    pub fn append_one(&self, item: T) -> bool {
        let key_of = Arc::clone(&self.key_of);
        self.state.update(move |items| {
            *items = append_to_frozen_array(items, item, |x: &T| key_of(x));
        })
    }

    /// Append `item` only if its key is absent.
    ///
    /// The presence check and the append happen under one write lock.
    /// Returns `true` if the item was added.
    pub fn try_append_one(&self, item: T) -> bool {
        let key_of = Arc::clone(&self.key_of);
        self.state
            .modify(move |items| {
                let before = items.len();
                *items = push_to_unique_array(items, item, |x: &T| key_of(x));
                items.len() > before
            })
            .1
    }

    /// Append several items, all or nothing.
    ///
    /// Fails with the first key that is already present or repeated within
    /// `new_items`, leaving the collection untouched. The check and the
    /// append happen under one write lock.
    pub fn try_append(&self, new_items: Vec<T>) -> Result<(), K> {
        let key_of = Arc::clone(&self.key_of);
        self.state
            .modify(move |items| {
                let mut incoming: Vec<K> = Vec::with_capacity(new_items.len());
                for item in &new_items {
                    let key = key_of(item);
                    if incoming.contains(&key) || items.iter().any(|existing| key_of(existing) == key) {
                        return Err(key);
                    }
                    incoming.push(key);
                }
                items.extend(new_items);
                Ok(())
            })
            .0
    }

    /// Append or replace several items in one notification.
    pub fn append(&self, new_items: Vec<T>) -> bool {
        let key_of = Arc::clone(&self.key_of);
        self.state.update(move |items| {
            *items = append_many_to_frozen_array(items, new_items, |x: &T| key_of(x));
        })
    }

    /// Remove the element with `key`, if any.
    pub fn remove_one(&self, key: &K) -> bool {
        let key_of = Arc::clone(&self.key_of);
        self.state
            .update(|items| items.retain(|item| key_of(item) != *key))
    }

    /// Remove every element whose key is in `keys`.
    pub fn remove(&self, keys: &[K]) -> bool {
        let key_of = Arc::clone(&self.key_of);
        self.state.update(|items| {
            *items = remove_from_frozen_array(items, keys, |x: &T| key_of(x));
        })
    }

    /// Keep only the elements matching `keep`.
    pub fn filter(&self, keep: impl Fn(&T) -> bool) -> bool {
        self.state.update(|items| items.retain(|item| keep(item)))
    }

    /// Patch the element with `key` in place. Returns `false` if absent.
    ///
    /// The key is the element's identity: a patch that changes it is
    /// discarded and `false` returned.
    pub fn update_one(&self, key: &K, patch: impl FnOnce(&mut T)) -> bool {
        let key_of = Arc::clone(&self.key_of);
        self.state.update(|items| {
            let Some(item) = items.iter_mut().find(|item| key_of(item) == *key) else {
                return;
            };
            let mut patched = item.clone();
            patch(&mut patched);
            if key_of(&patched) == *key {
                *item = patched;
            } else {
                tracing::debug!("discarding patch that changes the element key");
            }
        })
    }

    /// Whether an element with `key` is present.
    pub fn get_has_one(&self, key: &K) -> bool {
        self.state
            .with(|items| items.iter().any(|item| (self.key_of)(item) == *key))
    }

    /// Clone of the element with `key`.
    pub fn get_one(&self, key: &K) -> Option<T> {
        self.state.with(|items| {
            items
                .iter()
                .find(|item| (self.key_of)(item) == *key)
                .cloned()
        })
    }

    /// Atomically remove and return every element matching `take`.
    ///
    /// Reading and removing happen under one write lock, so a concurrent
    /// append lands either in the returned batch or in the collection,
    /// never both.
    pub fn take_where(&self, take: impl Fn(&T) -> bool) -> Vec<T> {
        if self.state.is_completed() {
            return Vec::new();
        }
        self.state
            .modify(|items| {
                let (taken, kept): (Vec<T>, Vec<T>) =
                    std::mem::take(items).into_iter().partition(|item| take(item));
                *items = kept;
                taken
            })
            .0
    }

    /// Remove everything.
    pub fn clear(&self) -> bool {
        self.state.set_value(Vec::new())
    }

    /// Subscribe to the whole collection (replay of one).
    pub fn subscribe(&self, next: impl Fn(&Vec<T>) + Send + Sync + 'static) -> Subscription {
        self.state.subscribe(next)
    }

    /// Read-only view of the collection.
    pub fn as_observable(&self) -> Observable<Vec<T>> {
        self.state.as_observable()
    }

    /// Projection of the collection.
    pub fn as_observable_part<U>(
        &self,
        map: impl Fn(&Vec<T>) -> U + Send + Sync + 'static,
    ) -> Observable<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
    {
        self.state.as_observable_part(map)
    }

    /// Projection onto the element with `key`.
    pub fn observe_one(&self, key: K) -> Observable<Option<T>> {
        let key_of = Arc::clone(&self.key_of);
        self.state.as_observable_part(move |items| {
            items.iter().find(|item| key_of(item) == key).cloned()
        })
    }

    /// Complete the underlying state.
    pub fn complete(&self) {
        self.state.complete();
    }

    /// Whether the collection has been completed.
    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }
}

impl<T, K> fmt::Debug for ArrayState<T, K>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayState")
            .field("items", &self.state.get_value())
            .field("completed", &self.state.is_completed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    struct Fragment {
        key: u32,
        category: &'static str,
    }

    fn frag(key: u32, category: &'static str) -> Fragment {
        Fragment { key, category }
    }

    fn fragments() -> ArrayState<Fragment, u32> {
        ArrayState::new(Vec::new(), |f: &Fragment| f.key)
    }

    #[test]
    fn test_new_dedupes_initial_keys() {
        let state = ArrayState::new(vec![(1, "a"), (2, "b"), (1, "c")], |x: &(u8, &str)| x.0);
        assert_eq!(state.get_value(), vec![(1, "c"), (2, "b")]);
    }

    #[test]
    fn test_update_one_cannot_change_the_key() {
        let state = fragments();
        state.append(vec![frag(1, "a"), frag(2, "b")]);

        assert!(!state.update_one(&1, |f| f.key = 2));
        assert!(state.update_one(&1, |f| f.category = "c"));

        assert_eq!(state.get_value(), vec![frag(1, "c"), frag(2, "b")]);
    }

    #[test]
    fn test_try_append_is_all_or_nothing() {
        let state = fragments();
        state.append_one(frag(1, "a"));
        let log = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&log);
        let _sub = state.subscribe(move |_| *sink.lock() += 1);

        assert_eq!(state.try_append(vec![frag(2, "b"), frag(1, "x")]), Err(1));
        assert_eq!(state.try_append(vec![frag(3, "b"), frag(3, "x")]), Err(3));
        assert_eq!(state.get_value(), vec![frag(1, "a")]);
        assert_eq!(*log.lock(), 1);

        assert_eq!(state.try_append(vec![frag(2, "b"), frag(3, "c")]), Ok(()));
        assert_eq!(state.get_value(), vec![frag(1, "a"), frag(2, "b"), frag(3, "c")]);
        assert_eq!(*log.lock(), 2);
    }

    #[test]
    fn test_append_one_replaces_on_collision() {
        let state = fragments();
        state.append_one(frag(1, "a"));
        state.append_one(frag(2, "a"));
        state.append_one(frag(1, "b"));
        assert_eq!(state.get_value(), vec![frag(1, "b"), frag(2, "a")]);
    }

    #[test]
    fn test_try_append_one_keeps_existing() {
        let state = fragments();
        assert!(state.try_append_one(frag(1, "a")));
        assert!(!state.try_append_one(frag(1, "b")));
        assert_eq!(state.get_value(), vec![frag(1, "a")]);
    }

    #[test]
    fn test_remove_and_filter() {
        let state = fragments();
        state.append(vec![frag(1, "a"), frag(2, "b"), frag(3, "a")]);
        assert!(state.remove_one(&2));
        assert!(!state.remove_one(&2));
        assert!(state.filter(|f| f.key != 1));
        assert_eq!(state.get_value(), vec![frag(3, "a")]);
    }

    #[test]
    fn test_update_one_and_lookups() {
        let state = fragments();
        state.append_one(frag(7, "a"));
        assert!(state.update_one(&7, |f| f.category = "z"));
        assert!(!state.update_one(&8, |f| f.category = "q"));
        assert!(state.get_has_one(&7));
        assert_eq!(state.get_one(&7), Some(frag(7, "z")));
        assert_eq!(state.get_one(&8), None);
    }

    #[test]
    fn test_take_where_drains_matches_only() {
        let state = fragments();
        state.append(vec![frag(1, "save"), frag(2, "other"), frag(3, "save")]);
        let taken = state.take_where(|f| f.category == "save");
        assert_eq!(taken, vec![frag(1, "save"), frag(3, "save")]);
        assert_eq!(state.get_value(), vec![frag(2, "other")]);
        assert!(state.take_where(|f| f.category == "save").is_empty());
    }

    #[test]
    fn test_observe_one_tracks_key() {
        let state = fragments();
        let one = state.observe_one(4);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = one.subscribe(move |f| sink.lock().push(f.clone()));

        state.append_one(frag(9, "x"));
        state.append_one(frag(4, "x"));
        state.remove_one(&4);

        assert_eq!(*seen.lock(), vec![None, Some(frag(4, "x")), None]);
    }

    #[test]
    fn test_completed_array_ignores_writes() {
        let state = fragments();
        state.append_one(frag(1, "a"));
        state.complete();
        assert!(!state.append_one(frag(2, "a")));
        assert_eq!(state.len(), 1);
    }
}
