//! In-memory repositories.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_app::repository::{DocumentRepository, DocumentTypeRepository, RepositoryError};
use backoffice_app::workspace::model::{Document, DocumentType};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// A repository call, as recorded by [`InMemoryDocumentRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentCall {
    /// `request_by_key`
    Request(String),
    /// `create_scaffold`
    Scaffold(Option<String>),
    /// `create`
    Create(String),
    /// `update`
    Update(String),
    /// `delete`
    Delete(String),
}

/// Document repository backed by a map.
///
/// Failures can be scripted per operation, and reads and writes can be held
/// at a gate until the test releases them.
#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: Mutex<HashMap<String, Document>>,
    calls: Mutex<Vec<DocumentCall>>,
    create_failure: Mutex<Option<RepositoryError>>,
    update_failure: Mutex<Option<RepositoryError>>,
    write_gate: Mutex<Option<Arc<Notify>>>,
    read_gate: Mutex<Option<Arc<Notify>>>,
    scaffold: Mutex<Option<Document>>,
}

impl InMemoryDocumentRepository {
    /// Empty repository.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Repository holding `documents`.
    pub fn with_documents(documents: Vec<Document>) -> Arc<Self> {
        let repository = Self::default();
        {
            let mut stored = repository.documents.lock();
            for document in documents {
                stored.insert(document.key.clone(), document);
            }
        }
        Arc::new(repository)
    }

    /// Document returned by `create_scaffold`; its parent key is filled in.
    pub fn set_scaffold(&self, document: Document) {
        *self.scaffold.lock() = Some(document);
    }

    /// Fail every `create` with `err` until cleared.
    pub fn fail_create(&self, err: Option<RepositoryError>) {
        *self.create_failure.lock() = err;
    }

    /// Fail every `update` with `err` until cleared.
    pub fn fail_update(&self, err: Option<RepositoryError>) {
        *self.update_failure.lock() = err;
    }

    /// Hold each `create` and `update` until `gate` is notified.
    pub fn hold_writes(&self, gate: Arc<Notify>) {
        *self.write_gate.lock() = Some(gate);
    }

    /// Hold each `request_by_key` until `gate` is notified.
    pub fn hold_reads(&self, gate: Arc<Notify>) {
        *self.read_gate.lock() = Some(gate);
    }

    /// Calls made so far.
    pub fn calls(&self) -> Vec<DocumentCall> {
        self.calls.lock().clone()
    }

    /// Stored document under `key`.
    pub fn stored(&self, key: &str) -> Option<Document> {
        self.documents.lock().get(key).cloned()
    }

    async fn wait_at(gate: &Mutex<Option<Arc<Notify>>>) {
        let gate = gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn record(&self, call: DocumentCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn request_by_key(&self, key: &str) -> Result<Document, RepositoryError> {
        self.record(DocumentCall::Request(key.to_string()));
        Self::wait_at(&self.read_gate).await;
        self.stored(key)
            .ok_or_else(|| RepositoryError::NotFound { key: key.to_string() })
    }

    async fn create_scaffold(&self, parent_key: Option<&str>) -> Result<Document, RepositoryError> {
        self.record(DocumentCall::Scaffold(parent_key.map(str::to_string)));
        let mut document = self.scaffold.lock().clone().unwrap_or_else(|| Document {
            key: "new-document".to_string(),
            ..Document::default()
        });
        document.parent_key = parent_key.map(str::to_string);
        Ok(document)
    }

    async fn create(&self, document: &Document) -> Result<(), RepositoryError> {
        self.record(DocumentCall::Create(document.key.clone()));
        Self::wait_at(&self.write_gate).await;
        if let Some(err) = self.create_failure.lock().clone() {
            return Err(err);
        }
        self.documents.lock().insert(document.key.clone(), document.clone());
        Ok(())
    }

    async fn update(&self, document: &Document) -> Result<(), RepositoryError> {
        self.record(DocumentCall::Update(document.key.clone()));
        Self::wait_at(&self.write_gate).await;
        if let Some(err) = self.update_failure.lock().clone() {
            return Err(err);
        }
        self.documents.lock().insert(document.key.clone(), document.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        self.record(DocumentCall::Delete(key.to_string()));
        self.documents
            .lock()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound { key: key.to_string() })
    }
}

/// Document type repository backed by a map. Records every key requested.
#[derive(Default)]
pub struct InMemoryDocumentTypeRepository {
    types: Mutex<HashMap<String, DocumentType>>,
    requests: Mutex<Vec<String>>,
}

impl InMemoryDocumentTypeRepository {
    /// Repository holding `types`.
    pub fn with_types(types: Vec<DocumentType>) -> Arc<Self> {
        let repository = Self::default();
        {
            let mut stored = repository.types.lock();
            for document_type in types {
                stored.insert(document_type.key.clone(), document_type);
            }
        }
        Arc::new(repository)
    }

    /// Keys requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DocumentTypeRepository for InMemoryDocumentTypeRepository {
    async fn request_by_key(&self, key: &str) -> Result<DocumentType, RepositoryError> {
        self.requests.lock().push(key.to_string());
        self.types
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound { key: key.to_string() })
    }
}
