//! Document and document type models.

use serde::{Deserialize, Serialize};

/// Entity type string of documents.
pub const DOCUMENT_ENTITY_TYPE: &str = "document";

/// A localized variant of a document, unique per (culture, segment).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVariant {
    /// Culture code, `None` for invariant
    pub culture: Option<String>,
    /// Segment alias, `None` for the default segment
    pub segment: Option<String>,
    /// Variant name
    pub name: String,
}

impl DocumentVariant {
    /// Whether this variant sits at (`culture`, `segment`).
    pub fn is_at(&self, culture: Option<&str>, segment: Option<&str>) -> bool {
        self.culture.as_deref() == culture && self.segment.as_deref() == segment
    }
}

/// A property value, unique per (alias, culture, segment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValue {
    /// Property type alias
    pub alias: String,
    /// Culture code, `None` for invariant
    #[serde(default)]
    pub culture: Option<String>,
    /// Segment alias, `None` for the default segment
    #[serde(default)]
    pub segment: Option<String>,
    /// Editor value
    pub value: serde_json::Value,
}

impl PropertyValue {
    /// Identity of this value inside a document.
    pub fn identity(&self) -> (String, Option<String>, Option<String>) {
        (self.alias.clone(), self.culture.clone(), self.segment.clone())
    }

    /// Whether this value sits at (`culture`, `segment`).
    pub fn is_at(&self, culture: Option<&str>, segment: Option<&str>) -> bool {
        self.culture.as_deref() == culture && self.segment.as_deref() == segment
    }
}

/// A document draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique key
    pub key: String,
    /// Key of the parent document, `None` at the root
    #[serde(default)]
    pub parent_key: Option<String>,
    /// Key of the document type
    #[serde(default)]
    pub content_type_key: Option<String>,
    /// Localized variants
    #[serde(default)]
    pub variants: Vec<DocumentVariant>,
    /// Property values
    #[serde(default)]
    pub properties: Vec<PropertyValue>,
}

/// Kind of a property container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerType {
    /// A group of properties
    Group,
    /// A tab holding groups or properties
    Tab,
}

/// A tab or group of a document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyContainer {
    /// Unique key
    pub key: String,
    /// Enclosing container, `None` at the root
    #[serde(default)]
    pub parent_key: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Group or tab
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    /// Sort order
    #[serde(default)]
    pub sort_order: i32,
}

/// A property definition of a document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyType {
    /// Unique key
    pub key: String,
    /// Alias used by property values
    pub alias: String,
    /// Display name
    pub name: String,
    /// Container the property is shown in
    #[serde(default)]
    pub container_key: Option<String>,
    /// Data type configuring the editor
    #[serde(default)]
    pub data_type_key: Option<String>,
    /// Sort order
    #[serde(default)]
    pub sort_order: i32,
}

/// Reference to a composed document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionRef {
    /// Key of the composed type
    pub key: String,
}

/// A document type (schema).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    /// Unique key
    pub key: String,
    /// Alias
    pub alias: String,
    /// Display name
    pub name: String,
    /// Types composed into this one
    #[serde(default)]
    pub compositions: Vec<CompositionRef>,
    /// Tabs and groups
    #[serde(default)]
    pub containers: Vec<PropertyContainer>,
    /// Property definitions
    #[serde(default)]
    pub properties: Vec<PropertyType>,
}
