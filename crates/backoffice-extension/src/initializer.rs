//! Extension initializers
//!
//! One initializer per manifest kind owns the instantiate/unload lifecycle of
//! every manifest of that kind. Loading races the host's lifecycle token: if
//! the host is destroyed mid-load, nothing is initialized or registered.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_core::{ControllerHost, LifecycleToken};
use parking_lot::Mutex;

use crate::errors::ExtensionError;
use crate::manifest::{Manifest, ManifestKind, ModuleRef};
use crate::module::{ModuleLoader, PluginModule};
use crate::registry::ExtensionRegistry;

/// Lifecycle handler for one manifest kind.
#[async_trait]
pub trait ExtensionInitializer: Send + Sync {
    /// Kind this initializer is bound to.
    fn kind(&self) -> ManifestKind;

    /// Called once per appearance of a manifest of [`kind`](Self::kind).
    async fn instantiate_extension(&self, manifest: &Manifest) -> Result<(), ExtensionError>;

    /// Called when the manifest is removed. Must release what
    /// [`instantiate_extension`](Self::instantiate_extension) created.
    async fn unload_extension(&self, manifest: &Manifest) -> Result<(), ExtensionError>;
}

/// Shared plumbing of the built-in initializers.
struct InitializerBase {
    host: ControllerHost,
    registry: ExtensionRegistry,
    loader: Arc<dyn ModuleLoader>,
    kind: ManifestKind,
}

impl InitializerBase {
    fn check_kind(&self, manifest: &Manifest) -> Result<(), ExtensionError> {
        if manifest.kind() == self.kind {
            Ok(())
        } else {
            Err(ExtensionError::KindMismatch {
                expected: self.kind,
                found: manifest.kind(),
            })
        }
    }

    async fn load(&self, alias: &str, module: &ModuleRef) -> Result<PluginModule, ExtensionError> {
        let lifecycle: LifecycleToken = self.host.lifecycle();
        let loaded = lifecycle
            .run_until_cancelled(self.loader.load(module))
            .await
            .ok_or_else(|| ExtensionError::Cancelled {
                alias: alias.to_string(),
            })??;
        if self.host.is_destroyed() {
            return Err(ExtensionError::Cancelled {
                alias: alias.to_string(),
            });
        }
        Ok(loaded)
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Initializer for `entryPoint` manifests.
///
/// Loads the referenced module and runs its `on_init` hook with the host and
/// the registry, letting the plugin register further manifests. Entry points
/// self-register and are never torn down, so unloading is a no-op.
pub struct EntryPointExtensionInitializer {
    base: InitializerBase,
}

impl EntryPointExtensionInitializer {
    /// Bind to `host` and `registry`, loading code through `loader`.
    pub fn new(
        host: ControllerHost,
        registry: ExtensionRegistry,
        loader: Arc<dyn ModuleLoader>,
    ) -> Self {
        Self {
            base: InitializerBase {
                host,
                registry,
                loader,
                kind: ManifestKind::EntryPoint,
            },
        }
    }
}

#[async_trait]
impl ExtensionInitializer for EntryPointExtensionInitializer {
    fn kind(&self) -> ManifestKind {
        self.base.kind
    }

    async fn instantiate_extension(&self, manifest: &Manifest) -> Result<(), ExtensionError> {
        self.base.check_kind(manifest)?;
        let Some(js) = manifest.module() else {
            return Ok(());
        };
        let module = self.base.load(manifest.alias(), js).await?;
        if let Some(on_init) = module.on_init() {
            tracing::debug!(alias = manifest.alias(), "running entry point on_init");
            on_init(&self.base.host, &self.base.registry);
        }
        Ok(())
    }

    async fn unload_extension(&self, manifest: &Manifest) -> Result<(), ExtensionError> {
        self.base.check_kind(manifest)
    }
}

// =============================================================================
// Bundles
// =============================================================================

/// Initializer for `bundle` manifests.
///
/// Registers the manifests the bundle's module exports and unregisters
/// exactly those again on unload.
pub struct BundleExtensionInitializer {
    base: InitializerBase,
    registered: Mutex<HashMap<String, Vec<String>>>,
}

impl BundleExtensionInitializer {
    /// Bind to `host` and `registry`, loading code through `loader`.
    pub fn new(
        host: ControllerHost,
        registry: ExtensionRegistry,
        loader: Arc<dyn ModuleLoader>,
    ) -> Self {
        Self {
            base: InitializerBase {
                host,
                registry,
                loader,
                kind: ManifestKind::Bundle,
            },
            registered: Mutex::new(HashMap::new()),
        }
    }

    /// Aliases registered on behalf of `bundle_alias`.
    pub fn registered_by(&self, bundle_alias: &str) -> Vec<String> {
        self.registered
            .lock()
            .get(bundle_alias)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExtensionInitializer for BundleExtensionInitializer {
    fn kind(&self) -> ManifestKind {
        self.base.kind
    }

    async fn instantiate_extension(&self, manifest: &Manifest) -> Result<(), ExtensionError> {
        self.base.check_kind(manifest)?;
        let Some(js) = manifest.module() else {
            return Ok(());
        };
        let module = self.base.load(manifest.alias(), js).await?;
        let exported = module.manifests().to_vec();
        let aliases: Vec<String> = exported.iter().map(|m| m.alias().to_string()).collect();
        self.base.registry.register_many(exported)?;
        tracing::info!(bundle = manifest.alias(), count = aliases.len(), "bundle registered");
        self.registered
            .lock()
            .insert(manifest.alias().to_string(), aliases);
        Ok(())
    }

    async fn unload_extension(&self, manifest: &Manifest) -> Result<(), ExtensionError> {
        self.base.check_kind(manifest)?;
        let aliases = self.registered.lock().remove(manifest.alias());
        if let Some(aliases) = aliases {
            self.base.registry.unregister_many(&aliases);
            tracing::info!(bundle = manifest.alias(), count = aliases.len(), "bundle unloaded");
        }
        Ok(())
    }
}
