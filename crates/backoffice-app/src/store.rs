//! Keyed entity store
//!
//! The client-side cache repositories write into and views read from. Items
//! are identified by a string key extracted from each item.

use std::fmt;
use std::sync::Arc;

use backoffice_core::{ArrayState, ContextToken, Observable};

/// Cache of entities of one kind, keyed by their unique key.
pub struct EntityStore<T> {
    alias: String,
    items: ArrayState<T, String>,
}

impl<T> EntityStore<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Empty store named `alias`, keying items with `key_of`.
    pub fn new(alias: impl Into<String>, key_of: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        Self {
            alias: alias.into(),
            items: ArrayState::new(Vec::new(), key_of),
        }
    }

    /// Store name, also used as its context alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Insert or replace `items`.
    pub fn append_items(&self, items: Vec<T>) -> bool {
        self.items.append(items)
    }

    /// Apply `patch` to the item under `key`. Returns `false` if absent.
    pub fn update_item(&self, key: &str, patch: impl FnOnce(&mut T)) -> bool {
        self.items.update_one(&key.to_string(), patch)
    }

    /// Drop the items under `keys`.
    pub fn remove_items(&self, keys: &[String]) -> bool {
        self.items.remove(keys)
    }

    /// Projection onto the item under `key`.
    pub fn by_key(&self, key: &str) -> Observable<Option<T>> {
        self.items.observe_one(key.to_string())
    }

    /// Snapshot of the item under `key`.
    pub fn get(&self, key: &str) -> Option<T> {
        self.items.get_one(&key.to_string())
    }

    /// Every item.
    pub fn all(&self) -> Observable<Vec<T>> {
        self.items.as_observable()
    }

    /// Number of cached items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Complete the store; later writes are ignored.
    pub fn destroy(&self) {
        self.items.complete();
    }

    /// Wrap for providing under a [`ContextToken`].
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Token type of entity stores.
pub type EntityStoreToken<T> = ContextToken<EntityStore<T>>;

impl<T> fmt::Debug for EntityStore<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("alias", &self.alias)
            .field("len", &self.len())
            .finish()
    }
}
