use async_trait::async_trait;
use backoffice_core::{ContextToken, Observable};

use super::model::DOCUMENT_ENTITY_TYPE;
use crate::errors::WorkspaceError;
use crate::repository::FieldError;

/// Editing session for one entity.
pub trait WorkspaceContext: Send + Sync {
    /// Entity type, e.g. `document`.
    fn entity_type(&self) -> &str;

    /// Key of the loaded entity, if any.
    fn entity_key(&self) -> Option<String>;

    /// Whether the entity has never been persisted.
    fn is_new(&self) -> Observable<bool>;

    /// Current value of [`is_new`](Self::is_new).
    fn get_is_new(&self) -> bool;

    /// Overwrite the new flag.
    fn set_is_new(&self, is_new: bool);

    /// Cancel in-flight work and complete all state.
    fn destroy(&self);
}

/// A workspace whose draft can be persisted.
#[async_trait]
pub trait SaveableWorkspaceContext: WorkspaceContext {
    /// Create when new, update otherwise. Clears the new flag on success.
    async fn save(&self) -> Result<(), WorkspaceError>;

    /// Persist the draft as a new entity without touching the new flag.
    async fn create(&self) -> Result<(), WorkspaceError>;

    /// Replace (or with `None`, clear) the validation errors of the draft.
    fn set_validation_errors(&self, errors: Option<Vec<FieldError>>);

    /// Validation errors of the draft.
    fn validation_errors(&self) -> Observable<Option<Vec<FieldError>>>;
}

/// The nearest workspace of any entity type.
pub const WORKSPACE_CONTEXT: ContextToken<dyn SaveableWorkspaceContext> =
    ContextToken::new("UmbWorkspaceContext");

/// The nearest workspace editing a document.
///
/// Shares the slot with [`WORKSPACE_CONTEXT`]; workspaces of other entity
/// types are skipped and the search continues upward.
pub const DOCUMENT_WORKSPACE_CONTEXT: ContextToken<dyn SaveableWorkspaceContext> =
    ContextToken::with_discriminator("UmbWorkspaceContext", is_document_workspace);

fn is_document_workspace(context: &(dyn SaveableWorkspaceContext + 'static)) -> bool {
    context.entity_type() == DOCUMENT_ENTITY_TYPE
}
