//! ControllerHost - typed provide/consume and lifetime-scoped observation.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::registry::{ConsumerId, ContextRegistry, Deliver, HostId, Instance, Matcher};
use super::token::ContextToken;
use super::ContextError;
use crate::lifecycle::LifecycleToken;
use crate::observable::Observable;

/// Handle onto one node of the host tree.
///
/// Clones address the same node. Every operation on a destroyed host
/// fails with [`ContextError::UnknownHost`] or returns an empty result.
#[derive(Clone)]
pub struct ControllerHost {
    registry: ContextRegistry,
    id: HostId,
}

fn matcher_for<T>(token: ContextToken<T>) -> Matcher
where
    T: ?Sized + Send + Sync + 'static,
{
    Arc::new(move |instance: &Instance| {
        (**instance)
            .downcast_ref::<Arc<T>>()
            .map_or(false, |typed| token.accepts(typed))
    })
}

fn typed<T>(instance: &Instance) -> Option<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    (**instance).downcast_ref::<Arc<T>>().map(Arc::clone)
}

/// Removes a one-shot consumer when the awaiting future is dropped early.
struct ConsumerGuard<'a> {
    registry: &'a ContextRegistry,
    id: ConsumerId,
}

impl Drop for ConsumerGuard<'_> {
    fn drop(&mut self) {
        self.registry.remove_consumer(self.id);
    }
}

impl ControllerHost {
    pub(crate) fn new(registry: ContextRegistry, id: HostId) -> Self {
        Self { registry, id }
    }

    /// Identifier of this host.
    pub fn id(&self) -> HostId {
        self.id
    }

    /// Registry this host lives in.
    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// Debug label given at creation.
    pub fn label(&self) -> Option<String> {
        self.registry.label_of(self.id)
    }

    /// Parent host, if any.
    pub fn parent(&self) -> Option<ControllerHost> {
        self.registry
            .parent_of(self.id)
            .map(|id| ControllerHost::new(self.registry.clone(), id))
    }

    /// Whether this host has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        !self.registry.contains(self.id)
    }

    /// Create a child host whose lookups continue through this one.
    pub fn create_child(&self, label: impl Into<String>) -> Result<ControllerHost, ContextError> {
        let id = self.registry.create_child(self.id, label.into())?;
        Ok(ControllerHost::new(self.registry.clone(), id))
    }

    /// Cancellation signal fired when this host is destroyed.
    ///
    /// A destroyed host hands out an already cancelled token.
    pub fn lifecycle(&self) -> LifecycleToken {
        self.registry.lifecycle_of(self.id).unwrap_or_else(|| {
            let token = LifecycleToken::new();
            token.cancel();
            token
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Providing
    // ─────────────────────────────────────────────────────────────────────────

    /// Make `instance` discoverable by this host and its descendants.
    ///
    /// Replaces any provider this host already had for the token's alias.
    /// Consumers that now resolve to `instance` are called before this
    /// returns.
    pub fn provide<T>(&self, token: &ContextToken<T>, instance: Arc<T>) -> Result<(), ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let erased: Instance = Arc::new(instance);
        self.registry.provide(self.id, token.alias(), erased)
    }

    /// Withdraw this host's provider for `token`.
    pub fn remove_provider<T>(&self, token: &ContextToken<T>) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.remove_provider(self.id, token.alias())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Consuming
    // ─────────────────────────────────────────────────────────────────────────

    /// Nearest qualifying provider, if one exists right now.
    pub fn get<T>(&self, token: &ContextToken<T>) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry
            .lookup(self.id, token.alias(), &matcher_for(*token))
            .and_then(|instance| typed::<T>(&instance))
    }

    /// Like [`get`](Self::get), failing when no provider exists.
    pub fn require<T>(&self, token: &ContextToken<T>) -> Result<Arc<T>, ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get(token).ok_or_else(|| ContextError::Unavailable {
            alias: token.alias().to_string(),
        })
    }

    /// Call `callback` with the nearest qualifying provider.
    ///
    /// Runs immediately if one exists, otherwise once one appears. Runs again
    /// whenever the resolved provider is replaced by another instance. The
    /// consumer lives until [`remove_consumer`](Self::remove_consumer) or
    /// until this host is destroyed.
    pub fn consume<T>(
        &self,
        token: &ContextToken<T>,
        callback: impl Fn(Arc<T>) + Send + Sync + 'static,
    ) -> Result<ConsumerId, ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let deliver: Deliver = Arc::new(move |instance: &Instance| {
            if let Some(instance) = typed::<T>(instance) {
                callback(instance);
            }
        });
        self.registry
            .add_consumer(self.id, token.alias(), matcher_for(*token), deliver, false)
    }

    /// Stop a consumer registered through [`consume`](Self::consume).
    pub fn remove_consumer(&self, id: ConsumerId) -> bool {
        self.registry.remove_consumer(id)
    }

    /// Wait for the nearest qualifying provider.
    ///
    /// Fails with [`ContextError::HostDestroyed`] if this host is destroyed
    /// before a provider appears.
    pub async fn request<T>(&self, token: &ContextToken<T>) -> Result<Arc<T>, ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel::<Arc<T>>();
        let slot = Mutex::new(Some(tx));
        let deliver: Deliver = Arc::new(move |instance: &Instance| {
            if let (Some(instance), Some(tx)) = (typed::<T>(instance), slot.lock().take()) {
                let _ = tx.send(instance);
            }
        });
        let id = self
            .registry
            .add_consumer(self.id, token.alias(), matcher_for(*token), deliver, true)?;
        let _guard = ConsumerGuard {
            registry: &self.registry,
            id,
        };
        rx.await.map_err(|_| ContextError::HostDestroyed {
            alias: token.alias().to_string(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────────────────────

    /// Subscribe to `source` for as long as this host lives.
    ///
    /// `callback` runs immediately with the current value. Observing again
    /// with the same `label` replaces the earlier subscription. Returns the
    /// label under which the subscription is held.
    pub fn observe<U>(
        &self,
        source: &Observable<U>,
        callback: impl Fn(&U) + Send + Sync + 'static,
        label: Option<&str>,
    ) -> Result<String, ContextError>
    where
        U: Clone + Send + Sync + 'static,
    {
        if self.is_destroyed() {
            return Err(ContextError::UnknownHost { host: self.id });
        }
        let subscription = source.subscribe(callback);
        self.registry
            .attach_observation(self.id, label.map(str::to_string), subscription)
    }

    /// Release the observation held under `label`.
    pub fn remove_observation(&self, label: &str) -> bool {
        self.registry.detach_observation(self.id, label)
    }

    /// Number of live observations held by this host.
    pub fn observation_count(&self) -> usize {
        self.registry.observation_count(self.id)
    }

    /// Destroy this host and all its descendants.
    ///
    /// Idempotent; returns `false` if the host was already gone.
    pub fn destroy(&self) -> bool {
        self.registry.destroy(self.id)
    }
}

impl fmt::Debug for ControllerHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerHost")
            .field("id", &self.id)
            .field("label", &self.label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::State;
    use assert_matches::assert_matches;

    #[derive(Debug)]
    struct Notifications {
        name: &'static str,
    }

    const NOTIFICATIONS: ContextToken<Notifications> = ContextToken::new("UmbNotificationContext");

    fn seen_names() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(Arc<Notifications>) + Send + Sync) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |n: Arc<Notifications>| sink.lock().push(n.name))
    }

    #[test]
    fn test_descendant_sees_ancestor_provider() {
        let registry = ContextRegistry::new();
        let root = registry.create_root("app");
        let leaf = root.create_child("section").unwrap().create_child("editor").unwrap();

        root.provide(&NOTIFICATIONS, Arc::new(Notifications { name: "root" }))
            .unwrap();
        assert_eq!(leaf.get(&NOTIFICATIONS).map(|n| n.name), Some("root"));
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_sibling_does_not_see_provider() {
        let registry = ContextRegistry::new();
        let root = registry.create_root("app");
        let a = root.create_child("a").unwrap();
        let b = root.create_child("b").unwrap();
        a.provide(&NOTIFICATIONS, Arc::new(Notifications { name: "a" }))
            .unwrap();
        assert!(b.get(&NOTIFICATIONS).is_none());
        assert_matches!(b.require(&NOTIFICATIONS), Err(ContextError::Unavailable { .. }));
    }

    #[test]
    fn test_consume_waits_then_follows_nearer_provider() {
        let registry = ContextRegistry::new();
        let root = registry.create_root("app");
        let mid = root.create_child("mid").unwrap();
        let leaf = mid.create_child("leaf").unwrap();

        let (log, callback) = seen_names();
        leaf.consume(&NOTIFICATIONS, callback).unwrap();
        assert!(log.lock().is_empty());
        assert_eq!(registry.pending_consumer_count(), 1);

        root.provide(&NOTIFICATIONS, Arc::new(Notifications { name: "root" }))
            .unwrap();
        mid.provide(&NOTIFICATIONS, Arc::new(Notifications { name: "mid" }))
            .unwrap();
        // Re-providing under an unrelated alias must not re-deliver
        root.provide(&ContextToken::<u8>::new("Other"), Arc::new(1))
            .unwrap();
        mid.remove_provider(&NOTIFICATIONS);

        assert_eq!(*log.lock(), vec!["root", "mid", "root"]);
    }

    #[test]
    fn test_replacing_provider_redelivers() {
        let registry = ContextRegistry::new();
        let root = registry.create_root("app");
        let (log, callback) = seen_names();
        let id = root.consume(&NOTIFICATIONS, callback).unwrap();
        root.provide(&NOTIFICATIONS, Arc::new(Notifications { name: "one" }))
            .unwrap();
        root.provide(&NOTIFICATIONS, Arc::new(Notifications { name: "two" }))
            .unwrap();
        assert!(root.remove_consumer(id));
        root.provide(&NOTIFICATIONS, Arc::new(Notifications { name: "three" }))
            .unwrap();
        assert_eq!(*log.lock(), vec!["one", "two"]);
    }

    #[test]
    fn test_discriminator_skips_to_next_ancestor() {
        trait Workspace: Send + Sync {
            fn entity_type(&self) -> &'static str;
        }
        struct Ws(&'static str);
        impl Workspace for Ws {
            fn entity_type(&self) -> &'static str {
                self.0
            }
        }
        const DOC: ContextToken<dyn Workspace> =
            ContextToken::with_discriminator("UmbWorkspaceContext", |w| w.entity_type() == "document");
        const ANY: ContextToken<dyn Workspace> = ContextToken::new("UmbWorkspaceContext");

        let registry = ContextRegistry::new();
        let root = registry.create_root("app");
        let inner = root.create_child("inner").unwrap();
        root.provide(&ANY, Arc::new(Ws("document")) as Arc<dyn Workspace>)
            .unwrap();
        inner
            .provide(&ANY, Arc::new(Ws("media")) as Arc<dyn Workspace>)
            .unwrap();

        assert_eq!(inner.get(&ANY).map(|w| w.entity_type()), Some("media"));
        assert_eq!(inner.get(&DOC).map(|w| w.entity_type()), Some("document"));
    }

    #[tokio::test]
    async fn test_request_resolves_when_provided_later() {
        let registry = ContextRegistry::new();
        let root = registry.create_root("app");
        let child = root.create_child("child").unwrap();

        let provider = root.clone();
        let pending = tokio::spawn(async move { child.request(&NOTIFICATIONS).await });
        tokio::task::yield_now().await;
        provider
            .provide(&NOTIFICATIONS, Arc::new(Notifications { name: "late" }))
            .unwrap();

        let resolved = pending.await.unwrap().unwrap();
        assert_eq!(resolved.name, "late");
        assert_eq!(registry.pending_consumer_count(), 0);
    }

    #[tokio::test]
    async fn test_request_fails_when_host_destroyed() {
        let registry = ContextRegistry::new();
        let root = registry.create_root("app");
        let child = root.create_child("child").unwrap();

        let requester = child.clone();
        let pending = tokio::spawn(async move { requester.request(&NOTIFICATIONS).await });
        tokio::task::yield_now().await;
        root.destroy();

        let err = pending.await.unwrap().unwrap_err();
        assert_eq!(
            err,
            ContextError::HostDestroyed {
                alias: "UmbNotificationContext".into()
            }
        );
    }

    #[test]
    fn test_observe_released_on_destroy() {
        let registry = ContextRegistry::new();
        let root = registry.create_root("app");
        let child = root.create_child("child").unwrap();
        let state = State::new(0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        child
            .observe(&state.as_observable(), move |v| sink.lock().push(*v), Some("count"))
            .unwrap();
        state.set_value(1);
        assert_eq!(state.observer_count(), 1);

        root.destroy();
        assert_eq!(state.observer_count(), 0);
        state.set_value(2);
        assert_eq!(*seen.lock(), vec![0, 1]);
        assert!(child.is_destroyed());
        assert_eq!(registry.host_count(), 0);
    }

    #[test]
    fn test_observe_same_label_replaces() {
        let registry = ContextRegistry::new();
        let host = registry.create_root("app");
        let state = State::new(0);
        host.observe(&state.as_observable(), |_| {}, Some("value"))
            .unwrap();
        host.observe(&state.as_observable(), |_| {}, Some("value"))
            .unwrap();
        let generated = host.observe(&state.as_observable(), |_| {}, None).unwrap();

        assert_eq!(host.observation_count(), 2);
        assert_eq!(state.observer_count(), 2);
        assert!(host.remove_observation(&generated));
        assert_eq!(state.observer_count(), 1);
    }

    #[test]
    fn test_destroy_cancels_lifecycle_and_blocks_use() {
        let registry = ContextRegistry::new();
        let root = registry.create_root("app");
        let child = root.create_child("child").unwrap();
        let token = child.lifecycle();

        assert!(root.destroy());
        assert!(!root.destroy());
        assert!(crate::lifecycle::CancellationToken::is_cancelled(&token));
        assert_matches!(
            child.provide(&NOTIFICATIONS, Arc::new(Notifications { name: "x" })),
            Err(ContextError::UnknownHost { .. })
        );
        assert_matches!(child.create_child("x"), Err(ContextError::UnknownHost { .. }));
    }
}
