//! Repository contracts the workspace talks to.
//!
//! Implementations own transport concerns. Errors are returned as values and
//! never cross the workspace boundary as panics.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::workspace::model::{Document, DocumentType};

/// A field-addressable validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Property alias or model path the error belongs to
    pub field: String,
    /// Human readable message
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// The payload was rejected field by field
    #[error("validation failed")]
    Validation {
        /// Field errors reported by the server
        errors: Vec<FieldError>,
    },

    /// No entity under the key
    #[error("'{key}' not found")]
    NotFound {
        /// Requested key
        key: String,
    },

    /// Transport or server error
    #[error("transport error: {message}")]
    Transport {
        /// Failure description
        message: String,
    },
}

/// Document persistence.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Fetch a persisted document.
    async fn request_by_key(&self, key: &str) -> Result<Document, RepositoryError>;

    /// Build a blank document under `parent_key` (`None` for the root).
    async fn create_scaffold(&self, parent_key: Option<&str>) -> Result<Document, RepositoryError>;

    /// Persist a new document.
    async fn create(&self, document: &Document) -> Result<(), RepositoryError>;

    /// Persist changes to an existing document.
    async fn update(&self, document: &Document) -> Result<(), RepositoryError>;

    /// Delete a document.
    async fn delete(&self, key: &str) -> Result<(), RepositoryError>;
}

/// Document type (schema) lookup.
#[async_trait]
pub trait DocumentTypeRepository: Send + Sync {
    /// Fetch one document type.
    async fn request_by_key(&self, key: &str) -> Result<DocumentType, RepositoryError>;
}
