//! Backoffice host
//!
//! Boots the root host with the notification and modal managers and the
//! extension registry, registers manifests from disk and settles the
//! entry point and bundle initializers once.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use backoffice_app::config::BackofficeConfig;
use backoffice_app::logging::init_logging;
use backoffice_app::modal::{ModalManagerContext, MODAL_MANAGER_CONTEXT};
use backoffice_app::notification::{NotificationContext, NOTIFICATION_CONTEXT};
use backoffice_core::ContextRegistry;
use backoffice_extension::{
    parse_manifests, BundleExtensionInitializer, EntryPointExtensionInitializer, ExtensionRegistry,
    InitializerDispatcher, ManifestKind, ModuleLoader, StaticModuleLoader, EXTENSION_REGISTRY,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "backoffice-host")]
#[command(about = "Boot the backoffice host and settle registered extensions", long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Additional manifest JSON files
    #[arg(short, long = "manifest")]
    manifests: Vec<PathBuf>,

    /// Log level, overrides the config file
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = BackofficeConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(level) = &args.log_level {
        config.set_from_string("logging.level", level)?;
    }
    init_logging(&config.logging);

    let root = ContextRegistry::new().create_root("backoffice");
    root.provide(&NOTIFICATION_CONTEXT, Arc::new(NotificationContext::from_config(&config)))?;
    root.provide(&MODAL_MANAGER_CONTEXT, Arc::new(ModalManagerContext::from_config(&config)))?;

    let registry = ExtensionRegistry::new();
    root.provide(&EXTENSION_REGISTRY, Arc::new(registry.clone()))?;

    let paths = config.extensions.manifest_paths.iter().chain(args.manifests.iter());
    for path in paths {
        let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let manifests = parse_manifests(&json).with_context(|| format!("parsing {}", path.display()))?;
        tracing::info!(path = %path.display(), count = manifests.len(), "registering manifests");
        registry.register_many(manifests)?;
    }

    let loader: Arc<dyn ModuleLoader> = Arc::new(StaticModuleLoader::new());
    let dispatcher = InitializerDispatcher::new(registry.clone())
        .with_initializer(Arc::new(EntryPointExtensionInitializer::new(
            root.clone(),
            registry.clone(),
            loader.clone(),
        )))
        .with_initializer(Arc::new(BundleExtensionInitializer::new(
            root.clone(),
            registry.clone(),
            loader,
        )));

    let report = dispatcher.settle().await;
    for (alias, err) in &report.failed {
        tracing::warn!(alias = %alias, error = %err, "extension failed to initialize");
    }

    for kind in [
        ManifestKind::EntryPoint,
        ManifestKind::Bundle,
        ManifestKind::SearchProvider,
        ManifestKind::Modal,
        ManifestKind::WorkspaceAction,
    ] {
        println!("{:<16} {}", kind.as_str(), registry.get_by_kind(kind).len());
    }
    println!(
        "instantiated {} failed {}",
        report.instantiated.len(),
        report.failed.len()
    );

    root.destroy();
    Ok(())
}
