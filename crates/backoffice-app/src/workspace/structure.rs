//! Content type structure of a workspace
//!
//! The effective schema of a document is its own type plus every type
//! reachable through `compositions`. Types and their containers are merged
//! into two flat keyed collections, so loading the same type twice never
//! duplicates anything.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use backoffice_core::{ArrayState, CancellationToken, LifecycleToken, Observable};

use super::model::{ContainerType, DocumentType, PropertyContainer, PropertyType};
use crate::errors::WorkspaceError;
use crate::repository::{DocumentTypeRepository, RepositoryError};

/// Merged document types and containers of one workspace.
pub struct ContentTypeStructure {
    types: Arc<dyn DocumentTypeRepository>,
    document_types: ArrayState<DocumentType, String>,
    containers: ArrayState<PropertyContainer, String>,
    lifecycle: LifecycleToken,
}

impl ContentTypeStructure {
    /// Empty structure loading through `types`, bound to `lifecycle`.
    pub fn new(types: Arc<dyn DocumentTypeRepository>, lifecycle: LifecycleToken) -> Self {
        Self {
            types,
            document_types: ArrayState::new(Vec::new(), |t: &DocumentType| t.key.clone()),
            containers: ArrayState::new(Vec::new(), |c: &PropertyContainer| c.key.clone()),
            lifecycle,
        }
    }

    /// Load `root_key` and everything it composes, breadth first.
    ///
    /// Each type is fetched at most once per call, so diamonds and cycles
    /// terminate. A composed type that no longer exists is skipped; any other
    /// failure aborts the load. Returns the keys loaded, in visiting order.
    pub async fn load(&self, root_key: &str) -> Result<Vec<String>, WorkspaceError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::from([root_key.to_string()]);
        let mut loaded = Vec::new();

        while let Some(key) = queue.pop_front() {
            if !visited.insert(key.clone()) {
                continue;
            }
            let fetched = self
                .lifecycle
                .run_until_cancelled(self.types.request_by_key(&key))
                .await
                .ok_or(WorkspaceError::Destroyed)?;
            if self.lifecycle.is_cancelled() {
                return Err(WorkspaceError::Destroyed);
            }
            let document_type = match fetched {
                Ok(document_type) => document_type,
                Err(RepositoryError::NotFound { .. }) if key != root_key => {
                    tracing::warn!(%key, "composed document type not found, skipping");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            queue.extend(
                document_type
                    .compositions
                    .iter()
                    .map(|c| c.key.clone())
                    .filter(|k| !visited.contains(k)),
            );
            self.containers.append(document_type.containers.clone());
            self.document_types.append_one(document_type);
            loaded.push(key);
        }

        tracing::debug!(root = root_key, count = loaded.len(), "content type structure loaded");
        Ok(loaded)
    }

    /// Every loaded document type.
    pub fn document_types(&self) -> Observable<Vec<DocumentType>> {
        self.document_types.as_observable()
    }

    /// Snapshot of the loaded document types.
    pub fn get_document_types(&self) -> Vec<DocumentType> {
        self.document_types.get_value()
    }

    /// Every loaded container.
    pub fn containers(&self) -> Observable<Vec<PropertyContainer>> {
        self.containers.as_observable()
    }

    /// Property types placed in `container_key`, across all loaded types.
    pub fn property_structures_of(&self, container_key: &str) -> Observable<Vec<PropertyType>> {
        let container_key = container_key.to_string();
        self.document_types.as_observable_part(move |types| {
            types
                .iter()
                .flat_map(|t| t.properties.iter())
                .filter(|p| p.container_key.as_deref() == Some(container_key.as_str()))
                .cloned()
                .collect()
        })
    }

    /// Top-level containers of `kind`.
    pub fn root_containers(&self, kind: ContainerType) -> Observable<Vec<PropertyContainer>> {
        self.containers_of_parent_key(None, kind)
    }

    /// Containers of `kind` directly under `parent_key`.
    pub fn containers_of_parent_key(
        &self,
        parent_key: Option<&str>,
        kind: ContainerType,
    ) -> Observable<Vec<PropertyContainer>> {
        let parent_key = parent_key.map(str::to_string);
        self.containers.as_observable_part(move |containers| {
            containers
                .iter()
                .filter(|c| c.parent_key == parent_key && c.container_type == kind)
                .cloned()
                .collect()
        })
    }

    /// Containers of `kind` called `name`. Compositions may each contribute
    /// one, which the editor shows merged.
    pub fn containers_by_name_and_type(&self, name: &str, kind: ContainerType) -> Observable<Vec<PropertyContainer>> {
        let name = name.to_string();
        self.containers.as_observable_part(move |containers| {
            containers
                .iter()
                .filter(|c| c.name.as_deref() == Some(name.as_str()) && c.container_type == kind)
                .cloned()
                .collect()
        })
    }

    /// Complete both collections.
    pub fn complete(&self) {
        self.document_types.complete();
        self.containers.complete();
    }
}

impl std::fmt::Debug for ContentTypeStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentTypeStructure")
            .field("document_types", &self.document_types.len())
            .field("containers", &self.containers.len())
            .finish()
    }
}
