//! Plugin modules and module loading.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_core::ControllerHost;
use parking_lot::RwLock;

use crate::errors::ExtensionError;
use crate::manifest::{Manifest, ModuleRef};
use crate::registry::ExtensionRegistry;

/// Initialization hook a module may export.
pub type InitHook = Arc<dyn Fn(&ControllerHost, &ExtensionRegistry) + Send + Sync>;

/// A loaded plugin module and its known exports.
#[derive(Clone, Default)]
pub struct PluginModule {
    on_init: Option<InitHook>,
    manifests: Vec<Manifest>,
}

impl PluginModule {
    /// A module with no exports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Export an `on_init` hook.
    pub fn with_on_init(
        mut self,
        hook: impl Fn(&ControllerHost, &ExtensionRegistry) + Send + Sync + 'static,
    ) -> Self {
        self.on_init = Some(Arc::new(hook));
        self
    }

    /// Export a list of manifests (bundles).
    pub fn with_manifests(mut self, manifests: Vec<Manifest>) -> Self {
        self.manifests = manifests;
        self
    }

    /// Whether the module exports an `on_init` hook.
    pub fn has_init_export(&self) -> bool {
        self.on_init.is_some()
    }

    /// The `on_init` hook, if exported.
    pub fn on_init(&self) -> Option<&InitHook> {
        self.on_init.as_ref()
    }

    /// Exported manifests.
    pub fn manifests(&self) -> &[Manifest] {
        &self.manifests
    }
}

impl fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginModule")
            .field("has_init_export", &self.has_init_export())
            .field("manifests", &self.manifests.len())
            .finish()
    }
}

/// Resolves module references to loaded modules.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load the module behind `module`.
    async fn load(&self, module: &ModuleRef) -> Result<PluginModule, ExtensionError>;
}

/// Loader over modules registered in-process.
#[derive(Default)]
pub struct StaticModuleLoader {
    modules: RwLock<HashMap<String, PluginModule>>,
}

impl StaticModuleLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `module` loadable under `path`, replacing any earlier one.
    pub fn insert(&self, path: impl Into<String>, module: PluginModule) {
        self.modules.write().insert(path.into(), module);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_module(self, path: impl Into<String>, module: PluginModule) -> Self {
        self.insert(path, module);
        self
    }

    /// Number of known modules.
    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    /// Whether no module is known.
    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn load(&self, module: &ModuleRef) -> Result<PluginModule, ExtensionError> {
        self.modules
            .read()
            .get(module.as_str())
            .cloned()
            .ok_or_else(|| ExtensionError::ModuleNotFound {
                module: module.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_static_loader_resolves_registered_modules() {
        let loader = StaticModuleLoader::new().with_module("/a.js", PluginModule::new().with_on_init(|_, _| {}));
        let module = loader.load(&ModuleRef::new("/a.js")).await.unwrap();
        assert!(module.has_init_export());

        let err = loader.load(&ModuleRef::new("/b.js")).await.unwrap_err();
        assert_matches!(err, ExtensionError::ModuleNotFound { module } if module == "/b.js");
    }

    #[test]
    fn test_module_without_hook() {
        let module = PluginModule::new();
        assert!(!module.has_init_export());
        assert!(module.manifests().is_empty());
    }
}
