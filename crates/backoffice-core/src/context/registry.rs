//! Host tree storage and provider resolution.
//!
//! All hosts of one application share a [`ContextRegistry`]. The registry
//! keeps parent links, per-host providers, pending consumers and
//! host-scoped subscriptions behind a single lock. Consumer callbacks are
//! collected under the lock and run after it is released.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::host::ControllerHost;
use super::ContextError;
use crate::lifecycle::LifecycleToken;
use crate::observable::Subscription;

pub(crate) type Instance = Arc<dyn Any + Send + Sync>;
pub(crate) type Matcher = Arc<dyn Fn(&Instance) -> bool + Send + Sync>;
pub(crate) type Deliver = Arc<dyn Fn(&Instance) + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier of a host in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostId(u64);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host-{}", self.0)
    }
}

/// Identifier of a registered consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerId(u64);

// ─────────────────────────────────────────────────────────────────────────────
// Internal state
// ─────────────────────────────────────────────────────────────────────────────

struct ProviderEntry {
    /// Unique per `provide` call; a replacement gets a fresh one.
    generation: u64,
    instance: Instance,
}

struct HostNode {
    label: String,
    parent: Option<HostId>,
    children: Vec<HostId>,
    providers: HashMap<&'static str, ProviderEntry>,
    observations: HashMap<String, Subscription>,
    lifecycle: LifecycleToken,
}

struct ConsumerEntry {
    id: ConsumerId,
    host: HostId,
    alias: &'static str,
    matcher: Matcher,
    deliver: Deliver,
    /// Generation of the provider last delivered.
    current: Option<u64>,
    once: bool,
}

#[derive(Default)]
struct RegistryState {
    nodes: HashMap<HostId, HostNode>,
    consumers: Vec<ConsumerEntry>,
    next_host: u64,
    next_consumer: u64,
    next_generation: u64,
    next_observation: u64,
}

type Deliveries = Vec<(Deliver, Instance)>;

fn lookup(
    nodes: &HashMap<HostId, HostNode>,
    start: HostId,
    alias: &str,
    matcher: &Matcher,
) -> Option<(u64, Instance)> {
    let mut cursor = Some(start);
    while let Some(id) = cursor {
        let node = nodes.get(&id)?;
        if let Some(entry) = node.providers.get(alias) {
            if matcher(&entry.instance) {
                return Some((entry.generation, Arc::clone(&entry.instance)));
            }
        }
        cursor = node.parent;
    }
    None
}

impl RegistryState {
    /// Re-resolve every consumer and collect the callbacks that must run.
    ///
    /// A consumer is re-delivered only when the provider it resolves to
    /// differs from the one it last saw. One-shot consumers are removed
    /// once delivered.
    fn resolve_consumers(&mut self) -> Deliveries {
        let Self {
            nodes, consumers, ..
        } = self;
        let mut deliveries = Vec::new();
        consumers.retain_mut(|consumer| {
            match lookup(nodes, consumer.host, consumer.alias, &consumer.matcher) {
                Some((generation, instance)) if consumer.current != Some(generation) => {
                    consumer.current = Some(generation);
                    deliveries.push((Arc::clone(&consumer.deliver), instance));
                    !consumer.once
                }
                Some(_) => true,
                None => {
                    consumer.current = None;
                    true
                }
            }
        });
        deliveries
    }
}

fn run(deliveries: Deliveries) {
    for (deliver, instance) in deliveries {
        deliver(&instance);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Shared store for one tree of hosts.
#[derive(Clone, Default)]
pub struct ContextRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl ContextRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root host with no parent.
    pub fn create_root(&self, label: impl Into<String>) -> ControllerHost {
        let label = label.into();
        let mut state = self.state.lock();
        let id = Self::insert_node(&mut state, None, label.clone());
        drop(state);
        tracing::debug!(host = %id, %label, "root host created");
        ControllerHost::new(self.clone(), id)
    }

    /// Number of live hosts.
    pub fn host_count(&self) -> usize {
        self.state.lock().nodes.len()
    }

    /// Number of registered consumers still waiting for a provider.
    pub fn pending_consumer_count(&self) -> usize {
        self.state
            .lock()
            .consumers
            .iter()
            .filter(|c| c.current.is_none())
            .count()
    }

    fn insert_node(state: &mut RegistryState, parent: Option<HostId>, label: String) -> HostId {
        let id = HostId(state.next_host);
        state.next_host += 1;
        state.nodes.insert(
            id,
            HostNode {
                label,
                parent,
                children: Vec::new(),
                providers: HashMap::new(),
                observations: HashMap::new(),
                lifecycle: LifecycleToken::new(),
            },
        );
        id
    }

    pub(crate) fn create_child(&self, parent: HostId, label: String) -> Result<HostId, ContextError> {
        let mut state = self.state.lock();
        if !state.nodes.contains_key(&parent) {
            return Err(ContextError::UnknownHost { host: parent });
        }
        let id = Self::insert_node(&mut state, Some(parent), label);
        if let Some(node) = state.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        Ok(id)
    }

    pub(crate) fn contains(&self, host: HostId) -> bool {
        self.state.lock().nodes.contains_key(&host)
    }

    pub(crate) fn label_of(&self, host: HostId) -> Option<String> {
        self.state.lock().nodes.get(&host).map(|n| n.label.clone())
    }

    pub(crate) fn parent_of(&self, host: HostId) -> Option<HostId> {
        self.state.lock().nodes.get(&host).and_then(|n| n.parent)
    }

    pub(crate) fn lifecycle_of(&self, host: HostId) -> Option<LifecycleToken> {
        self.state.lock().nodes.get(&host).map(|n| n.lifecycle.clone())
    }

    pub(crate) fn provide(
        &self,
        host: HostId,
        alias: &'static str,
        instance: Instance,
    ) -> Result<(), ContextError> {
        let deliveries = {
            let mut state = self.state.lock();
            let generation = state.next_generation;
            state.next_generation += 1;
            let node = state
                .nodes
                .get_mut(&host)
                .ok_or(ContextError::UnknownHost { host })?;
            let replaced = node
                .providers
                .insert(alias, ProviderEntry { generation, instance })
                .is_some();
            tracing::debug!(%host, alias, replaced, "context provided");
            state.resolve_consumers()
        };
        run(deliveries);
        Ok(())
    }

    pub(crate) fn remove_provider(&self, host: HostId, alias: &str) -> bool {
        let (removed, deliveries) = {
            let mut state = self.state.lock();
            let removed = state
                .nodes
                .get_mut(&host)
                .and_then(|node| node.providers.remove(alias));
            match removed {
                Some(entry) => (Some(entry), state.resolve_consumers()),
                None => (None, Vec::new()),
            }
        };
        run(deliveries);
        if removed.is_some() {
            tracing::debug!(%host, alias, "context withdrawn");
        }
        removed.is_some()
    }

    pub(crate) fn lookup(&self, host: HostId, alias: &str, matcher: &Matcher) -> Option<Instance> {
        let state = self.state.lock();
        lookup(&state.nodes, host, alias, matcher).map(|(_, instance)| instance)
    }

    pub(crate) fn add_consumer(
        &self,
        host: HostId,
        alias: &'static str,
        matcher: Matcher,
        deliver: Deliver,
        once: bool,
    ) -> Result<ConsumerId, ContextError> {
        let (id, deliveries) = {
            let mut state = self.state.lock();
            if !state.nodes.contains_key(&host) {
                return Err(ContextError::UnknownHost { host });
            }
            let id = ConsumerId(state.next_consumer);
            state.next_consumer += 1;
            state.consumers.push(ConsumerEntry {
                id,
                host,
                alias,
                matcher,
                deliver,
                current: None,
                once,
            });
            (id, state.resolve_consumers())
        };
        run(deliveries);
        Ok(id)
    }

    pub(crate) fn remove_consumer(&self, id: ConsumerId) -> bool {
        let removed = {
            let mut state = self.state.lock();
            let index = state.consumers.iter().position(|c| c.id == id);
            index.map(|i| state.consumers.remove(i))
        };
        removed.is_some()
    }

    pub(crate) fn attach_observation(
        &self,
        host: HostId,
        label: Option<String>,
        subscription: Subscription,
    ) -> Result<String, ContextError> {
        let mut state = self.state.lock();
        let label = match label {
            Some(label) => label,
            None => {
                let n = state.next_observation;
                state.next_observation += 1;
                format!("observer-{n}")
            }
        };
        let Some(node) = state.nodes.get_mut(&host) else {
            drop(state);
            drop(subscription);
            return Err(ContextError::UnknownHost { host });
        };
        let previous = node.observations.insert(label.clone(), subscription);
        drop(state);
        drop(previous);
        Ok(label)
    }

    pub(crate) fn detach_observation(&self, host: HostId, label: &str) -> bool {
        let removed = {
            let mut state = self.state.lock();
            state
                .nodes
                .get_mut(&host)
                .and_then(|node| node.observations.remove(label))
        };
        removed.is_some()
    }

    pub(crate) fn observation_count(&self, host: HostId) -> usize {
        self.state
            .lock()
            .nodes
            .get(&host)
            .map_or(0, |n| n.observations.len())
    }

    /// Destroy `host` and its whole subtree.
    ///
    /// Providers are withdrawn, lifecycle tokens cancelled, observations
    /// released and pending consumers dropped. Returns `false` if the host
    /// was already gone.
    pub(crate) fn destroy(&self, host: HostId) -> bool {
        let mut lifecycles = Vec::new();
        let mut observations = Vec::new();
        let dropped_consumers: Vec<ConsumerEntry>;
        {
            let mut state = self.state.lock();
            let Some(parent) = state.nodes.get(&host).map(|n| n.parent) else {
                return false;
            };
            if let Some(parent) = parent.and_then(|p| state.nodes.get_mut(&p)) {
                parent.children.retain(|child| *child != host);
            }

            let mut removed = HashSet::new();
            let mut stack = vec![host];
            while let Some(id) = stack.pop() {
                if let Some(node) = state.nodes.remove(&id) {
                    stack.extend(node.children.iter().copied());
                    lifecycles.push(node.lifecycle);
                    observations.extend(node.observations.into_values());
                    removed.insert(id);
                }
            }

            let (dropped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.consumers)
                .into_iter()
                .partition(|c| removed.contains(&c.host));
            state.consumers = kept;
            dropped_consumers = dropped;
            tracing::debug!(%host, hosts = removed.len(), "host subtree destroyed");
        }

        for lifecycle in &lifecycles {
            lifecycle.cancel();
        }
        drop(observations);
        drop(dropped_consumers);
        true
    }
}

impl fmt::Debug for ContextRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ContextRegistry")
            .field("hosts", &state.nodes.len())
            .field("consumers", &state.consumers.len())
            .finish()
    }
}
