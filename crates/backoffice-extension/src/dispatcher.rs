//! Initializer dispatcher
//!
//! Watches the registry and drives the initializer bound to each manifest's
//! kind: instantiate on appearance, unload on removal (or before a
//! replacement is instantiated). Manifests of kinds without an initializer
//! are left alone. A manifest whose instantiation failed is not tried again
//! until it is unregistered or replaced.

use std::collections::HashMap;
use std::sync::Arc;

use backoffice_core::{CancellationToken, LifecycleToken};
use tokio::sync::{Mutex, Notify};

use crate::errors::ExtensionError;
use crate::initializer::ExtensionInitializer;
use crate::manifest::{Manifest, ManifestKind};
use crate::registry::ExtensionRegistry;

/// Upper bound on passes in [`InitializerDispatcher::settle`].
const MAX_SETTLE_PASSES: usize = 32;

/// Outcome of one or more dispatch passes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Aliases instantiated
    pub instantiated: Vec<String>,
    /// Aliases unloaded
    pub unloaded: Vec<String>,
    /// Aliases whose initializer failed, with the error
    pub failed: Vec<(String, ExtensionError)>,
}

impl DispatchReport {
    /// Whether the pass changed anything.
    pub fn is_quiet(&self) -> bool {
        self.instantiated.is_empty() && self.unloaded.is_empty()
    }

    fn absorb(&mut self, other: DispatchReport) {
        self.instantiated.extend(other.instantiated);
        self.unloaded.extend(other.unloaded);
        self.failed.extend(other.failed);
    }
}

/// Manifests the dispatcher has acted on, by alias.
#[derive(Default)]
struct Tracked {
    active: HashMap<String, Manifest>,
    failed: HashMap<String, Manifest>,
}

/// Drives per-kind initializers from the registry contents.
pub struct InitializerDispatcher {
    registry: ExtensionRegistry,
    initializers: HashMap<ManifestKind, Arc<dyn ExtensionInitializer>>,
    /// Held across a whole pass so passes never interleave.
    tracked: Mutex<Tracked>,
}

impl InitializerDispatcher {
    /// Create a dispatcher with no initializers.
    pub fn new(registry: ExtensionRegistry) -> Self {
        Self {
            registry,
            initializers: HashMap::new(),
            tracked: Mutex::new(Tracked::default()),
        }
    }

    /// Bind `initializer` to its kind, replacing any earlier binding.
    pub fn with_initializer(mut self, initializer: Arc<dyn ExtensionInitializer>) -> Self {
        self.initializers.insert(initializer.kind(), initializer);
        self
    }

    /// Kinds that have an initializer.
    pub fn handled_kinds(&self) -> Vec<ManifestKind> {
        let mut kinds: Vec<_> = self.initializers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Aliases currently instantiated.
    pub async fn active_aliases(&self) -> Vec<String> {
        let mut aliases: Vec<_> = self.tracked.lock().await.active.keys().cloned().collect();
        aliases.sort();
        aliases
    }

    /// Aliases whose instantiation failed and that are still registered
    /// unchanged.
    pub async fn failed_aliases(&self) -> Vec<String> {
        let mut aliases: Vec<_> = self.tracked.lock().await.failed.keys().cloned().collect();
        aliases.sort();
        aliases
    }

    /// Reconcile once against the current registry contents.
    pub async fn sync(&self) -> DispatchReport {
        let mut tracked = self.tracked.lock().await;
        let Tracked { active, failed } = &mut *tracked;
        let current: Vec<Manifest> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|m| self.initializers.contains_key(&m.kind()))
            .collect();
        let mut report = DispatchReport::default();

        // Forget failures whose manifest vanished or was replaced
        failed.retain(|alias, manifest| {
            current
                .iter()
                .any(|m| m.alias() == alias.as_str() && *m == *manifest)
        });

        // Unload what vanished or was replaced
        let stale: Vec<String> = active
            .iter()
            .filter(|(alias, manifest)| {
                !current
                    .iter()
                    .any(|m| m.alias() == alias.as_str() && m == *manifest)
            })
            .map(|(alias, _)| alias.clone())
            .collect();
        for alias in stale {
            let Some(manifest) = active.remove(&alias) else {
                continue;
            };
            let Some(initializer) = self.initializers.get(&manifest.kind()) else {
                continue;
            };
            match initializer.unload_extension(&manifest).await {
                Ok(()) => report.unloaded.push(alias),
                Err(err) => {
                    tracing::warn!(%alias, error = %err, "extension unload failed");
                    report.failed.push((alias, err));
                }
            }
        }

        // Instantiate what appeared
        for manifest in current {
            if active.contains_key(manifest.alias()) || failed.contains_key(manifest.alias()) {
                continue;
            }
            let Some(initializer) = self.initializers.get(&manifest.kind()) else {
                continue;
            };
            let alias = manifest.alias().to_string();
            match initializer.instantiate_extension(&manifest).await {
                Ok(()) => {
                    tracing::debug!(%alias, kind = %manifest.kind(), "extension instantiated");
                    active.insert(alias.clone(), manifest);
                    report.instantiated.push(alias);
                }
                Err(err) => {
                    tracing::warn!(%alias, error = %err, "extension instantiation failed");
                    failed.insert(alias.clone(), manifest);
                    report.failed.push((alias, err));
                }
            }
        }

        report
    }

    /// Run [`sync`](Self::sync) until a pass changes nothing.
    ///
    /// Entry points and bundles register more manifests while they are
    /// instantiated, so one pass is not always enough. Failures are reported
    /// once, in the pass that hit them.
    pub async fn settle(&self) -> DispatchReport {
        let mut total = DispatchReport::default();
        for _ in 0..MAX_SETTLE_PASSES {
            let pass = self.sync().await;
            let quiet = pass.is_quiet();
            total.absorb(pass);
            if quiet {
                return total;
            }
        }
        tracing::warn!(passes = MAX_SETTLE_PASSES, "extension dispatch did not settle");
        total
    }

    /// Keep the initializers in step with the registry until `lifecycle` fires.
    ///
    /// Returns everything done along the way.
    pub async fn run(&self, lifecycle: LifecycleToken) -> DispatchReport {
        let changed = Arc::new(Notify::new());
        let signal = Arc::clone(&changed);
        let _watch = self.registry.subscribe(move |_| signal.notify_one());

        let mut total = DispatchReport::default();
        loop {
            let Some(pass) = lifecycle.run_until_cancelled(self.sync()).await else {
                break;
            };
            total.absorb(pass);
            tokio::select! {
                biased;
                _ = lifecycle.cancelled() => break,
                _ = changed.notified() => {}
            }
        }
        tracing::debug!(
            instantiated = total.instantiated.len(),
            unloaded = total.unloaded.len(),
            "extension dispatcher stopped"
        );
        total
    }
}

impl std::fmt::Debug for InitializerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializerDispatcher")
            .field("kinds", &self.handled_kinds())
            .finish()
    }
}
