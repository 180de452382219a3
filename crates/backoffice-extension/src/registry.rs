//! Extension registry
//!
//! Process-wide table of manifests, indexed by alias and queryable by kind.
//! Every mutation, including the duplicate check that guards it, is a
//! single atomic update of the underlying [`ArrayState`], so observers
//! always see a consistent table.

use backoffice_core::context::ContextToken;
use backoffice_core::{ArrayState, Observable, Subscription};

use crate::errors::ExtensionError;
use crate::manifest::{Manifest, ManifestKind};

/// Token under which the application root provides the registry.
pub const EXTENSION_REGISTRY: ContextToken<ExtensionRegistry> =
    ContextToken::new("UmbExtensionRegistry");

/// Observable manifest table keyed by alias.
#[derive(Clone)]
pub struct ExtensionRegistry {
    manifests: ArrayState<Manifest, String>,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_by_weight(mut manifests: Vec<Manifest>) -> Vec<Manifest> {
    // Stable: equal weights keep registration order
    manifests.sort_by_key(|m| std::cmp::Reverse(m.weight()));
    manifests
}

impl ExtensionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            manifests: ArrayState::new(Vec::new(), |m: &Manifest| m.alias().to_string()),
        }
    }

    /// Register one manifest.
    ///
    /// Fails if the manifest is invalid or its alias is taken.
    pub fn register(&self, manifest: Manifest) -> Result<(), ExtensionError> {
        manifest.validate()?;
        let alias = manifest.alias().to_string();
        let kind = manifest.kind();
        if !self.manifests.try_append_one(manifest) {
            tracing::warn!(%alias, "rejected duplicate extension alias");
            return Err(ExtensionError::DuplicateAlias { alias });
        }
        tracing::debug!(%alias, %kind, "extension registered");
        Ok(())
    }

    /// Register several manifests, all or nothing.
    pub fn register_many(&self, manifests: Vec<Manifest>) -> Result<(), ExtensionError> {
        for manifest in &manifests {
            manifest.validate()?;
        }
        let count = manifests.len();
        if let Err(alias) = self.manifests.try_append(manifests) {
            tracing::warn!(%alias, "rejected duplicate extension alias");
            return Err(ExtensionError::DuplicateAlias { alias });
        }
        tracing::debug!(count, "extensions registered");
        Ok(())
    }

    /// Remove the manifest registered under `alias`.
    pub fn unregister(&self, alias: &str) -> bool {
        let removed = self.manifests.remove_one(&alias.to_string());
        if removed {
            tracing::debug!(%alias, "extension unregistered");
        }
        removed
    }

    /// Remove several manifests in one update.
    pub fn unregister_many(&self, aliases: &[String]) -> bool {
        self.manifests.remove(aliases)
    }

    /// Whether `alias` is registered.
    pub fn is_registered(&self, alias: &str) -> bool {
        self.manifests.get_has_one(&alias.to_string())
    }

    /// Manifest registered under `alias`.
    pub fn get_by_alias(&self, alias: &str) -> Option<Manifest> {
        self.manifests.get_one(&alias.to_string())
    }

    /// Manifests of `kind`, highest weight first.
    pub fn get_by_kind(&self, kind: ManifestKind) -> Vec<Manifest> {
        sorted_by_weight(
            self.manifests
                .get_value()
                .into_iter()
                .filter(|m| m.kind() == kind)
                .collect(),
        )
    }

    /// Live view of the manifests of `kind`, highest weight first.
    pub fn by_kind(&self, kind: ManifestKind) -> Observable<Vec<Manifest>> {
        self.manifests.as_observable_part(move |all| {
            sorted_by_weight(all.iter().filter(|m| m.kind() == kind).cloned().collect())
        })
    }

    /// Live view of the manifest registered under `alias`.
    pub fn by_alias(&self, alias: &str) -> Observable<Option<Manifest>> {
        self.manifests.observe_one(alias.to_string())
    }

    /// Live view of the whole table, in registration order.
    pub fn manifests(&self) -> Observable<Vec<Manifest>> {
        self.manifests.as_observable()
    }

    /// Snapshot of the whole table, in registration order.
    pub fn snapshot(&self) -> Vec<Manifest> {
        self.manifests.get_value()
    }

    /// Subscribe to table changes.
    pub fn subscribe(&self, next: impl Fn(&Vec<Manifest>) + Send + Sync + 'static) -> Subscription {
        self.manifests.subscribe(next)
    }

    /// Number of registered manifests.
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("manifests", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{EntryPointManifest, ModalManifest};
    use assert_matches::assert_matches;

    fn modal(alias: &str, weight: Option<i32>) -> Manifest {
        Manifest::Modal(ModalManifest {
            alias: alias.into(),
            name: alias.into(),
            weight,
            element: None,
        })
    }

    fn entry(alias: &str) -> Manifest {
        Manifest::EntryPoint(EntryPointManifest {
            alias: alias.into(),
            name: alias.into(),
            weight: None,
            js: None,
        })
    }

    #[test]
    fn test_register_rejects_duplicate_alias() {
        let registry = ExtensionRegistry::new();
        registry.register(modal("Umb.Modal.Confirm", None)).unwrap();
        let err = registry.register(entry("Umb.Modal.Confirm")).unwrap_err();
        assert_matches!(err, ExtensionError::DuplicateAlias { alias } if alias == "Umb.Modal.Confirm");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_many_is_all_or_nothing() {
        let registry = ExtensionRegistry::new();
        registry.register(modal("taken", None)).unwrap();
        let err = registry
            .register_many(vec![modal("fresh", None), modal("taken", None)])
            .unwrap_err();
        assert_matches!(err, ExtensionError::DuplicateAlias { .. });
        assert!(!registry.is_registered("fresh"));

        let err = registry
            .register_many(vec![modal("a", None), modal("a", None)])
            .unwrap_err();
        assert_matches!(err, ExtensionError::DuplicateAlias { .. });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_register_many_admits_one_batch_per_alias() {
        let registry = ExtensionRegistry::new();
        let barrier = std::sync::Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                let barrier = std::sync::Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    registry
                        .register_many(vec![modal(&format!("own-{i}"), None), modal("shared", None)])
                        .is_ok()
                })
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(admitted, 1);
        assert_eq!(registry.len(), 2);
        assert!(registry.is_registered("shared"));
    }

    #[test]
    fn test_by_kind_sorted_by_weight_and_live() {
        let registry = ExtensionRegistry::new();
        registry.register(modal("low", Some(1))).unwrap();
        registry.register(entry("entry")).unwrap();
        let modals = registry.by_kind(ManifestKind::Modal);
        registry.register(modal("high", Some(10))).unwrap();

        let aliases: Vec<String> = modals.get_value().iter().map(|m| m.alias().to_string()).collect();
        assert_eq!(aliases, vec!["high", "low"]);

        registry.unregister("high");
        assert_eq!(modals.get_value().len(), 1);
        assert_eq!(registry.get_by_kind(ManifestKind::EntryPoint).len(), 1);
    }

    #[test]
    fn test_unregister_missing_alias() {
        let registry = ExtensionRegistry::new();
        assert!(!registry.unregister("nope"));
        registry.register(entry("x")).unwrap();
        assert!(registry.unregister_many(&["x".to_string()]));
        assert!(registry.is_empty());
    }
}
