use std::sync::Arc;

use backoffice_core::ControllerHost;

use super::interface::{SaveableWorkspaceContext, WORKSPACE_CONTEXT};
use crate::errors::WorkspaceError;
use crate::notification::{NotificationColor, NotificationContext, NotificationData};

/// Category under which save failures are collected as fragments.
pub const SAVE_ERRORS_CATEGORY: &str = "save-errors";

/// The workspace's Save/Create button.
pub struct SaveWorkspaceAction {
    workspace: Arc<dyn SaveableWorkspaceContext>,
    notifications: Option<Arc<NotificationContext>>,
}

impl SaveWorkspaceAction {
    /// Action for `workspace`.
    pub fn new(workspace: Arc<dyn SaveableWorkspaceContext>) -> Self {
        Self {
            workspace,
            notifications: None,
        }
    }

    /// Action for the nearest workspace above `host`, waiting for one to be
    /// provided.
    pub async fn from_host(host: &ControllerHost) -> Result<Self, WorkspaceError> {
        let workspace = host.request(&WORKSPACE_CONTEXT).await?;
        Ok(Self::new(workspace))
    }

    /// Report failures through `notifications`.
    pub fn with_notifications(mut self, notifications: Arc<NotificationContext>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Button label for the current state.
    pub fn label(&self) -> &'static str {
        if self.workspace.get_is_new() {
            "Create"
        } else {
            "Save"
        }
    }

    /// Create a new entity or save an existing one.
    ///
    /// For a new entity, validation failures are handed to the workspace
    /// (the entity stays new) and returned. Other failures leave the
    /// workspace untouched. On success prior validation errors are cleared
    /// and the entity is no longer new.
    pub async fn execute(&self) -> Result<(), WorkspaceError> {
        let outcome = if self.workspace.get_is_new() {
            self.create().await
        } else {
            self.workspace.save().await
        };
        if let Err(err) = &outcome {
            self.report(err);
        }
        outcome
    }

    async fn create(&self) -> Result<(), WorkspaceError> {
        match self.workspace.create().await {
            Ok(()) => {
                self.workspace.set_validation_errors(None);
                self.workspace.set_is_new(false);
                Ok(())
            }
            Err(WorkspaceError::Validation { errors }) => {
                tracing::warn!(count = errors.len(), "create rejected by validation");
                self.workspace.set_validation_errors(Some(errors.clone()));
                Err(WorkspaceError::Validation { errors })
            }
            Err(err) => Err(err),
        }
    }

    fn report(&self, err: &WorkspaceError) {
        let Some(notifications) = &self.notifications else {
            return;
        };
        let color = err.category().notification_color();
        if color == NotificationColor::Default {
            return;
        }
        match err {
            WorkspaceError::Validation { errors } => {
                for field in errors {
                    notifications.append(
                        color,
                        NotificationData::with_headline(field.field.clone(), field.message.clone()),
                        SAVE_ERRORS_CATEGORY,
                    );
                }
                notifications.peek_compilation(SAVE_ERRORS_CATEGORY, None);
            }
            other => {
                notifications.peek(color, NotificationData::message(other.to_string()));
            }
        }
    }
}

impl std::fmt::Debug for SaveWorkspaceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveWorkspaceAction")
            .field("label", &self.label())
            .field("notifies", &self.notifications.is_some())
            .finish()
    }
}
