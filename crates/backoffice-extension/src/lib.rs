//! Backoffice Extension - Manifest-Driven Plugin Wiring
//!
//! Plugins describe themselves with [`manifest::Manifest`] records. The
//! [`registry::ExtensionRegistry`] indexes them by alias and kind, and the
//! [`dispatcher::InitializerDispatcher`] hands each one to the
//! [`initializer::ExtensionInitializer`] bound to its kind.
//!
//! ```rust,ignore
//! let registry = ExtensionRegistry::new();
//! let loader: Arc<dyn ModuleLoader> = Arc::new(StaticModuleLoader::new());
//! let dispatcher = InitializerDispatcher::new(registry.clone())
//!     .with_initializer(Arc::new(EntryPointExtensionInitializer::new(
//!         host.clone(),
//!         registry.clone(),
//!         loader.clone(),
//!     )));
//!
//! registry.register_many(parse_manifests(&json)?)?;
//! let report = dispatcher.settle().await;
//! ```

#![forbid(unsafe_code)]

/// Initializer dispatch loop
pub mod dispatcher;

/// Extension errors
pub mod errors;

/// Per-kind lifecycle handlers
pub mod initializer;

/// Manifest records and parsing
pub mod manifest;

/// Plugin modules and loaders
pub mod module;

/// Manifest table
pub mod registry;

pub use dispatcher::{DispatchReport, InitializerDispatcher};
pub use errors::ExtensionError;
pub use initializer::{BundleExtensionInitializer, EntryPointExtensionInitializer, ExtensionInitializer};
pub use manifest::{parse_manifests, Manifest, ManifestKind, ModuleRef};
pub use module::{InitHook, ModuleLoader, PluginModule, StaticModuleLoader};
pub use registry::{ExtensionRegistry, EXTENSION_REGISTRY};
