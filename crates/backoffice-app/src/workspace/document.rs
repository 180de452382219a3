use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_core::observable::frozen::{append_to_frozen_array, upsert_frozen_array};
use backoffice_core::{
    BooleanState, CancellationToken, ContextError, ControllerHost, LifecycleToken, Observable, State,
};

use super::interface::{SaveableWorkspaceContext, WorkspaceContext, WORKSPACE_CONTEXT};
use super::model::{Document, DocumentVariant, PropertyValue, DOCUMENT_ENTITY_TYPE};
use super::structure::ContentTypeStructure;
use crate::errors::WorkspaceError;
use crate::repository::{DocumentRepository, DocumentTypeRepository, FieldError, RepositoryError};

/// Workspace editing one document.
///
/// Owns its own child host, under which it provides itself as
/// [`WORKSPACE_CONTEXT`]. Every async operation races the host's lifecycle
/// and re-checks it before touching state, so a destroyed workspace never
/// mutates after the fact.
pub struct DocumentWorkspaceContext {
    host: ControllerHost,
    lifecycle: LifecycleToken,
    documents: Arc<dyn DocumentRepository>,
    data: State<Option<Document>>,
    is_new: BooleanState,
    validation_errors: State<Option<Vec<FieldError>>>,
    structure: ContentTypeStructure,
    save_lock: tokio::sync::Mutex<()>,
}

impl DocumentWorkspaceContext {
    /// Create the workspace under `parent` and provide it there.
    pub fn new(
        parent: &ControllerHost,
        documents: Arc<dyn DocumentRepository>,
        types: Arc<dyn DocumentTypeRepository>,
    ) -> Result<Arc<Self>, ContextError> {
        let host = parent.create_child("document-workspace")?;
        let lifecycle = host.lifecycle();
        let context = Arc::new(Self {
            structure: ContentTypeStructure::new(types, lifecycle.clone()),
            host: host.clone(),
            lifecycle,
            documents,
            data: State::new(None),
            is_new: BooleanState::new(false),
            validation_errors: State::new(None),
            save_lock: tokio::sync::Mutex::new(()),
        });
        let provided: Arc<dyn SaveableWorkspaceContext> = context.clone();
        host.provide(&WORKSPACE_CONTEXT, provided)?;
        tracing::debug!(host = %host.id(), "document workspace created");
        Ok(context)
    }

    /// The workspace's own host. Editors for this document live below it.
    pub fn host(&self) -> &ControllerHost {
        &self.host
    }

    /// Composed content type structure.
    pub fn structure(&self) -> &ContentTypeStructure {
        &self.structure
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Views
    // ─────────────────────────────────────────────────────────────────────────

    /// The draft.
    pub fn data(&self) -> Observable<Option<Document>> {
        self.data.as_observable()
    }

    /// Snapshot of the draft.
    pub fn get_data(&self) -> Option<Document> {
        self.data.get_value()
    }

    /// Document type of the draft.
    pub fn document_type_key(&self) -> Observable<Option<String>> {
        self.data
            .as_observable_part(|data| data.as_ref().and_then(|d| d.content_type_key.clone()))
    }

    /// Variants of the draft.
    pub fn variants(&self) -> Observable<Vec<DocumentVariant>> {
        self.data
            .as_observable_part(|data| data.as_ref().map(|d| d.variants.clone()).unwrap_or_default())
    }

    /// Name of the variant at (`culture`, `segment`).
    pub fn name(&self, culture: Option<&str>, segment: Option<&str>) -> Observable<Option<String>> {
        let (culture, segment) = (culture.map(str::to_string), segment.map(str::to_string));
        self.data.as_observable_part(move |data| {
            data.as_ref()?
                .variants
                .iter()
                .find(|v| v.is_at(culture.as_deref(), segment.as_deref()))
                .map(|v| v.name.clone())
        })
    }

    /// Property values at (`culture`, `segment`).
    pub fn property_values_of(
        &self,
        culture: Option<&str>,
        segment: Option<&str>,
    ) -> Observable<Vec<PropertyValue>> {
        let (culture, segment) = (culture.map(str::to_string), segment.map(str::to_string));
        self.data.as_observable_part(move |data| {
            data.as_ref()
                .map(|d| {
                    d.properties
                        .iter()
                        .filter(|p| p.is_at(culture.as_deref(), segment.as_deref()))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    /// The value of `alias` at (`culture`, `segment`).
    pub fn property_value_of_alias(
        &self,
        alias: &str,
        culture: Option<&str>,
        segment: Option<&str>,
    ) -> Observable<Option<PropertyValue>> {
        let alias = alias.to_string();
        let (culture, segment) = (culture.map(str::to_string), segment.map(str::to_string));
        self.data.as_observable_part(move |data| {
            data.as_ref()?
                .properties
                .iter()
                .find(|p| p.alias == alias && p.is_at(culture.as_deref(), segment.as_deref()))
                .cloned()
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────

    /// Load a persisted document.
    ///
    /// On failure the draft is left as it was. The document's type structure
    /// is loaded after the draft is in place; a structure failure is returned
    /// but keeps the draft.
    pub async fn load(&self, key: &str) -> Result<(), WorkspaceError> {
        let document = self.guarded(self.documents.request_by_key(key)).await?;
        let type_key = document.content_type_key.clone();
        self.is_new.set_value(false);
        self.data.set_value(Some(document));
        tracing::debug!(%key, "document loaded");
        self.load_structure(type_key).await
    }

    /// Start a new document under `parent_key`.
    pub async fn create_scaffold(&self, parent_key: Option<&str>) -> Result<(), WorkspaceError> {
        let document = self.guarded(self.documents.create_scaffold(parent_key)).await?;
        let type_key = document.content_type_key.clone();
        self.is_new.set_value(true);
        self.data.set_value(Some(document));
        tracing::debug!(parent = ?parent_key, "document scaffold created");
        self.load_structure(type_key).await
    }

    async fn load_structure(&self, type_key: Option<String>) -> Result<(), WorkspaceError> {
        match type_key {
            Some(type_key) => self.structure.load(&type_key).await.map(|_| ()),
            None => Ok(()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Editing
    // ─────────────────────────────────────────────────────────────────────────

    /// Name the variant at (`culture`, `segment`), adding it if missing.
    ///
    /// Returns `false` when there is no draft or nothing changed.
    pub fn set_name(&self, name: &str, culture: Option<&str>, segment: Option<&str>) -> bool {
        self.data.patch(|document| {
            document.variants = upsert_frozen_array(
                &document.variants,
                |v| v.is_at(culture, segment),
                || DocumentVariant {
                    culture: culture.map(str::to_string),
                    segment: segment.map(str::to_string),
                    name: String::new(),
                },
                |v| v.name = name.to_string(),
            );
        })
    }

    /// Set the value of `alias` at (`culture`, `segment`).
    ///
    /// Returns `false` when there is no draft or nothing changed.
    pub fn set_property_value(
        &self,
        alias: &str,
        value: serde_json::Value,
        culture: Option<&str>,
        segment: Option<&str>,
    ) -> bool {
        let entry = PropertyValue {
            alias: alias.to_string(),
            culture: culture.map(str::to_string),
            segment: segment.map(str::to_string),
            value,
        };
        self.data.patch(|document| {
            document.properties = append_to_frozen_array(&document.properties, entry, PropertyValue::identity);
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Delete a document through the repository.
    pub async fn delete(&self, key: &str) -> Result<(), WorkspaceError> {
        self.guarded(self.documents.delete(key)).await?;
        tracing::info!(%key, "document deleted");
        Ok(())
    }

    async fn persist(&self, as_new: bool) -> Result<(), WorkspaceError> {
        let _in_flight = self
            .save_lock
            .try_lock()
            .map_err(|_| WorkspaceError::SaveInProgress)?;
        self.ensure_alive()?;
        let draft = self.data.get_value().ok_or(WorkspaceError::NoDraft)?;
        if as_new {
            self.guarded(self.documents.create(&draft)).await?;
        } else {
            self.guarded(self.documents.update(&draft)).await?;
        }
        tracing::info!(key = %draft.key, created = as_new, "document persisted");
        Ok(())
    }

    /// Run a repository call unless the workspace dies first, then re-check
    /// that it is still alive.
    async fn guarded<T>(
        &self,
        call: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, WorkspaceError> {
        self.ensure_alive()?;
        let outcome = self
            .lifecycle
            .run_until_cancelled(call)
            .await
            .ok_or(WorkspaceError::Destroyed)?;
        self.ensure_alive()?;
        Ok(outcome?)
    }

    fn ensure_alive(&self) -> Result<(), WorkspaceError> {
        if self.lifecycle.is_cancelled() {
            Err(WorkspaceError::Destroyed)
        } else {
            Ok(())
        }
    }
}

impl WorkspaceContext for DocumentWorkspaceContext {
    fn entity_type(&self) -> &str {
        DOCUMENT_ENTITY_TYPE
    }

    fn entity_key(&self) -> Option<String> {
        self.data.with(|data| data.as_ref().map(|d| d.key.clone()))
    }

    fn is_new(&self) -> Observable<bool> {
        self.is_new.as_observable()
    }

    fn get_is_new(&self) -> bool {
        self.is_new.get_value()
    }

    fn set_is_new(&self, is_new: bool) {
        self.is_new.set_value(is_new);
    }

    fn destroy(&self) {
        if self.host.destroy() {
            tracing::debug!(key = ?self.entity_key(), "document workspace destroyed");
        }
        self.lifecycle.cancel();
        self.data.complete();
        self.is_new.complete();
        self.validation_errors.complete();
        self.structure.complete();
    }
}

#[async_trait]
impl SaveableWorkspaceContext for DocumentWorkspaceContext {
    async fn save(&self) -> Result<(), WorkspaceError> {
        let was_new = self.is_new.get_value();
        self.persist(was_new).await?;
        if was_new {
            self.is_new.set_value(false);
        }
        Ok(())
    }

    async fn create(&self) -> Result<(), WorkspaceError> {
        self.persist(true).await
    }

    fn set_validation_errors(&self, errors: Option<Vec<FieldError>>) {
        self.validation_errors.set_value(errors);
    }

    fn validation_errors(&self) -> Observable<Option<Vec<FieldError>>> {
        self.validation_errors.as_observable()
    }
}

impl std::fmt::Debug for DocumentWorkspaceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentWorkspaceContext")
            .field("host", &self.host.id())
            .field("key", &self.entity_key())
            .field("is_new", &self.is_new.get_value())
            .finish()
    }
}
