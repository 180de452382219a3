//! Workspaces
//!
//! A workspace is the editing session for one entity: the draft, derived
//! views over it, the composed content type structure, and save/create/delete
//! orchestration against a repository.
//!
//! # Usage
//!
//! ```rust,ignore
//! let workspace = DocumentWorkspaceContext::new(&root, documents, document_types)?;
//! workspace.load("0b1c...").await?;
//! workspace.set_name("Forside", Some("da-dk"), None);
//! SaveWorkspaceAction::new(workspace.clone()).execute().await?;
//! ```

mod document;
mod interface;
pub mod model;
mod save_action;
mod structure;

pub use document::DocumentWorkspaceContext;
pub use interface::{
    SaveableWorkspaceContext, WorkspaceContext, DOCUMENT_WORKSPACE_CONTEXT, WORKSPACE_CONTEXT,
};
pub use save_action::{SaveWorkspaceAction, SAVE_ERRORS_CATEGORY};
pub use structure::ContentTypeStructure;
