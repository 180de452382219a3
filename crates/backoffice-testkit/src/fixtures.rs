//! Documents and document types.

use backoffice_app::workspace::model::{
    CompositionRef, ContainerType, Document, DocumentType, DocumentVariant, PropertyContainer, PropertyType,
};

/// Invariant document named `name`, of type `A` (see [`diamond_types`]).
pub fn document(key: &str, name: &str) -> Document {
    Document {
        key: key.to_string(),
        parent_key: None,
        content_type_key: Some("A".to_string()),
        variants: vec![DocumentVariant {
            culture: None,
            segment: None,
            name: name.to_string(),
        }],
        properties: Vec::new(),
    }
}

/// Document type `key` composing `compositions`, with one tab and one
/// property of its own.
pub fn document_type(key: &str, compositions: &[&str]) -> DocumentType {
    let tab = format!("{key}-tab");
    DocumentType {
        key: key.to_string(),
        alias: key.to_lowercase(),
        name: key.to_string(),
        compositions: compositions
            .iter()
            .map(|c| CompositionRef { key: c.to_string() })
            .collect(),
        containers: vec![PropertyContainer {
            key: tab.clone(),
            parent_key: None,
            name: Some(format!("{key} tab")),
            container_type: ContainerType::Tab,
            sort_order: 0,
        }],
        properties: vec![PropertyType {
            key: format!("{key}-prop"),
            alias: format!("{}Prop", key.to_lowercase()),
            name: format!("{key} property"),
            container_key: Some(tab),
            data_type_key: None,
            sort_order: 0,
        }],
    }
}

/// `A` composes `B` and `C`, both of which compose `D`.
pub fn diamond_types() -> Vec<DocumentType> {
    vec![
        document_type("A", &["B", "C"]),
        document_type("B", &["D"]),
        document_type("C", &["D"]),
        document_type("D", &[]),
    ]
}

/// `X` composes `Y`, which composes `X`.
pub fn cycle_types() -> Vec<DocumentType> {
    vec![document_type("X", &["Y"]), document_type("Y", &["X"])]
}
