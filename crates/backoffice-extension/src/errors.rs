//! Extension layer errors.

use crate::manifest::ManifestKind;

/// Failures while registering, loading or initializing extensions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtensionError {
    /// A manifest with this alias is already registered
    #[error("extension alias '{alias}' is already registered")]
    DuplicateAlias {
        /// Conflicting alias
        alias: String,
    },

    /// The manifest is structurally valid JSON but unusable
    #[error("invalid manifest '{alias}': {reason}")]
    InvalidManifest {
        /// Alias of the offending manifest (may be empty)
        alias: String,
        /// What is wrong with it
        reason: String,
    },

    /// No module is known under the referenced path
    #[error("module '{module}' not found")]
    ModuleNotFound {
        /// Module reference
        module: String,
    },

    /// An initializer was handed a manifest of another kind
    #[error("initializer for '{expected}' cannot handle '{found}' manifests")]
    KindMismatch {
        /// Kind the initializer is bound to
        expected: ManifestKind,
        /// Kind of the manifest it received
        found: ManifestKind,
    },

    /// The owning host was destroyed while the extension was loading
    #[error("instantiation of '{alias}' cancelled")]
    Cancelled {
        /// Alias of the extension
        alias: String,
    },

    /// Manifest JSON could not be parsed
    #[error("manifest parse error: {message}")]
    Parse {
        /// Parser message
        message: String,
    },
}

impl From<serde_json::Error> for ExtensionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}
