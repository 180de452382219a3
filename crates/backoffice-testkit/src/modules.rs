//! Plugin modules that record their initialization.

use std::sync::Arc;

use backoffice_extension::{Manifest, PluginModule};
use parking_lot::Mutex;

/// Shared log of module events.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Fresh empty log.
pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Module whose `on_init` pushes `name` to `log` and registers `extra`.
pub fn recording_entry_point(name: &str, log: &EventLog, extra: Vec<Manifest>) -> PluginModule {
    let (name, log) = (name.to_string(), Arc::clone(log));
    PluginModule::new().with_on_init(move |_host, registry| {
        log.lock().push(name.clone());
        if !extra.is_empty() {
            let _ = registry.register_many(extra.clone());
        }
    })
}

/// Module exporting `manifests`, as a bundle does.
pub fn bundle_module(manifests: Vec<Manifest>) -> PluginModule {
    PluginModule::new().with_manifests(manifests)
}

/// Parse one manifest from JSON.
pub fn manifest(json: serde_json::Value) -> Manifest {
    serde_json::from_value(json).expect("valid manifest")
}
