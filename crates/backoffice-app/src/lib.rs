//! Backoffice App - Workspaces, Managers and Block Grid
//!
//! Domain contexts built on `backoffice-core`:
//!
//! - [`workspace`]: the document workspace, its composed content type
//!   structure and the save/create workspace action
//! - [`notification`]: peeking and staying notifications plus categorized
//!   fragments compiled into one notification per color
//! - [`modal`]: typed modal tokens and the manager that opens them
//! - [`block_grid`]: entries that keep their layout within their block type
//! - [`store`]: keyed entity caches
//!
//! Ambient concerns live in [`config`], [`errors`] and [`logging`].

#![forbid(unsafe_code)]

/// Block grid entry contexts and span fitting
pub mod block_grid;

/// Layered configuration
pub mod config;

/// Error types and categories
pub mod errors;

/// Tracing subscriber setup
pub mod logging;

/// Modal manager
pub mod modal;

/// Notification manager
pub mod notification;

/// Repository seams
pub mod repository;

/// Keyed entity stores
pub mod store;

/// Workspace contexts and actions
pub mod workspace;

pub use config::BackofficeConfig;
pub use errors::{ConfigError, ErrorCategory, ModalError, WorkspaceError};
pub use logging::init_logging;
pub use modal::{ModalArgs, ModalManagerContext, ModalToken, MODAL_MANAGER_CONTEXT};
pub use notification::{NotificationColor, NotificationContext, NotificationData, NOTIFICATION_CONTEXT};
pub use repository::{DocumentRepository, DocumentTypeRepository, FieldError, RepositoryError};
pub use store::EntityStore;
pub use workspace::{
    DocumentWorkspaceContext, SaveWorkspaceAction, SaveableWorkspaceContext, WorkspaceContext,
    DOCUMENT_WORKSPACE_CONTEXT, WORKSPACE_CONTEXT,
};
