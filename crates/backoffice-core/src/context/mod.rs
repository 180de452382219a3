//! # Context Host
//!
//! Hosts form a tree inside a shared [`ContextRegistry`]. A host can provide
//! a typed service under a [`ContextToken`]; the host itself and every
//! descendant can then consume it. Lookup walks registry-held parent links,
//! so no host needs a reference to its ancestors.
//!
//! ## Lifetimes
//!
//! Destroying a host destroys its subtree: providers are withdrawn, pending
//! consumers dropped (an awaiting [`ControllerHost::request`] fails with
//! [`ContextError::HostDestroyed`]), every subscription made through
//! [`ControllerHost::observe`] is released and the host's
//! [`LifecycleToken`](crate::lifecycle::LifecycleToken) is cancelled.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use backoffice_core::context::{ContextRegistry, ContextToken};
//!
//! struct Modals;
//! const MODAL_MANAGER: ContextToken<Modals> = ContextToken::new("UmbModalManagerContext");
//!
//! let registry = ContextRegistry::new();
//! let app = registry.create_root("app");
//! let editor = app.create_child("editor").unwrap();
//!
//! app.provide(&MODAL_MANAGER, Arc::new(Modals)).unwrap();
//! assert!(editor.get(&MODAL_MANAGER).is_some());
//! ```

mod host;
mod registry;
mod token;

pub use host::ControllerHost;
pub use registry::{ConsumerId, ContextRegistry, HostId};
pub use token::ContextToken;

/// Context lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The requesting host was torn down before a provider appeared
    #[error("host destroyed before context '{alias}' became available")]
    HostDestroyed {
        /// Alias of the requested token
        alias: String,
    },

    /// The host is not (or no longer) part of the tree
    #[error("{host} is not alive")]
    UnknownHost {
        /// Host the operation targeted
        host: HostId,
    },

    /// No qualifying provider exists right now
    #[error("no provider for context '{alias}'")]
    Unavailable {
        /// Alias of the requested token
        alias: String,
    },
}
