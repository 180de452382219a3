//! Categorized application errors
//!
//! Every error the app layer surfaces maps to an [`ErrorCategory`], which
//! decides how it is shown to the user (notification color) and whether a
//! retry could help.

use std::fmt;
use std::path::PathBuf;

use backoffice_core::ContextError;

use crate::notification::NotificationColor;
use crate::repository::{FieldError, RepositoryError};

// ============================================================================
// Error Categories
// ============================================================================

/// High-level error categories for user-facing error handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Input validation errors (correctable by the user)
    Input,
    /// Configuration errors (correctable by modifying settings)
    Config,
    /// Resource not found
    NotFound,
    /// Transport failures (often transient)
    Network,
    /// The operation was abandoned because its owner went away
    Cancelled,
    /// General operation failures (catch-all)
    Operation,
}

impl ErrorCategory {
    /// Whether the user can fix the problem themselves.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Input | Self::Config)
    }

    /// Whether a retry may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Notification color used to report errors of this category.
    #[must_use]
    pub fn notification_color(&self) -> NotificationColor {
        match self {
            Self::Input | Self::Config | Self::NotFound => NotificationColor::Warning,
            Self::Network | Self::Operation => NotificationColor::Danger,
            Self::Cancelled => NotificationColor::Default,
        }
    }

    /// Short label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Config => "Config",
            Self::NotFound => "Not Found",
            Self::Network => "Network",
            Self::Cancelled => "Cancelled",
            Self::Operation => "Operation",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Workspace errors
// ============================================================================

/// Failures of workspace operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkspaceError {
    /// The operation needs a draft and none is loaded
    #[error("workspace has no draft")]
    NoDraft,

    /// The repository rejected the draft with field errors
    #[error("validation failed ({} field errors)", errors.len())]
    Validation {
        /// Field-level errors
        errors: Vec<FieldError>,
    },

    /// The entity does not exist
    #[error("entity '{key}' not found")]
    NotFound {
        /// Requested key
        key: String,
    },

    /// Transport or server failure
    #[error("repository failure: {message}")]
    Repository {
        /// Failure description
        message: String,
    },

    /// Another save of this workspace is still in flight
    #[error("a save is already in progress")]
    SaveInProgress,

    /// The workspace was destroyed before or during the operation
    #[error("workspace destroyed")]
    Destroyed,

    /// A required context could not be resolved
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl WorkspaceError {
    /// Category used for reporting.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Input,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Repository { .. } => ErrorCategory::Network,
            Self::Destroyed => ErrorCategory::Cancelled,
            Self::Context(_) => ErrorCategory::Config,
            Self::NoDraft | Self::SaveInProgress => ErrorCategory::Operation,
        }
    }
}

impl From<RepositoryError> for WorkspaceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation { errors } => Self::Validation { errors },
            RepositoryError::NotFound { key } => Self::NotFound { key },
            RepositoryError::Transport { message } => Self::Repository { message },
        }
    }
}

// ============================================================================
// Modal errors
// ============================================================================

/// Ways a modal can end without a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModalError {
    /// Closed or cancelled by the user
    #[error("modal '{key}' was rejected")]
    Rejected {
        /// Modal key
        key: String,
    },

    /// Every handle was dropped without settling the modal
    #[error("modal '{key}' was dismissed without a result")]
    Dismissed {
        /// Modal key
        key: String,
    },

    /// Submitted value has a different type than the opener expects
    #[error("modal '{key}' was submitted with an unexpected value type")]
    ValueType {
        /// Modal key
        key: String,
    },
}

// ============================================================================
// Configuration errors
// ============================================================================

/// Configuration loading and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {}: {message}", path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// OS error message
        message: String,
    },

    /// TOML could not be parsed
    #[error("invalid configuration: {message}")]
    Parse {
        /// Parser message
        message: String,
    },

    /// A key is unknown or its value unusable
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue {
        /// Dotted key, e.g. `notifications.peek_duration_ms`
        key: String,
        /// What is wrong
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}
