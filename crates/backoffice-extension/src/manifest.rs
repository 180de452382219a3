//! Extension manifests
//!
//! A manifest is a declarative record naming one extension point. The set of
//! kinds is closed: every manifest deserializes into exactly one variant of
//! [`Manifest`], selected by its `type` field. Records with an unknown
//! `type` fail to parse instead of being carried around untyped.
//!
//! ```rust
//! use backoffice_extension::manifest::{parse_manifests, ManifestKind};
//!
//! let manifests = parse_manifests(r#"[
//!     { "type": "entryPoint", "alias": "My.EntryPoint", "name": "My Entry", "js": "/my/entry.js" },
//!     { "type": "searchProvider", "alias": "My.Search", "name": "Search", "meta": { "label": "Docs" } }
//! ]"#).unwrap();
//!
//! assert_eq!(manifests[0].kind(), ManifestKind::EntryPoint);
//! assert_eq!(manifests[1].alias(), "My.Search");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ExtensionError;

// =============================================================================
// Kinds
// =============================================================================

/// Discriminator of a manifest, as it appears in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManifestKind {
    /// Code that runs once at startup and may register more manifests
    EntryPoint,
    /// A module exporting a list of manifests
    Bundle,
    /// A global search provider
    SearchProvider,
    /// A modal element
    Modal,
    /// An action button shown in a workspace footer
    WorkspaceAction,
}

impl ManifestKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntryPoint => "entryPoint",
            Self::Bundle => "bundle",
            Self::SearchProvider => "searchProvider",
            Self::Modal => "modal",
            Self::WorkspaceAction => "workspaceAction",
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a loadable plugin module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleRef(String);

impl ModuleRef {
    /// Create a module reference.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Path or identifier of the module.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Manifest records
// =============================================================================

/// `entryPoint` manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPointManifest {
    /// Globally unique alias
    pub alias: String,
    /// Human readable name
    pub name: String,
    /// Sort weight; higher comes first
    #[serde(default)]
    pub weight: Option<i32>,
    /// Module to load and initialize
    #[serde(default)]
    pub js: Option<ModuleRef>,
}

/// `bundle` manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleManifest {
    /// Globally unique alias
    pub alias: String,
    /// Human readable name
    pub name: String,
    /// Sort weight; higher comes first
    #[serde(default)]
    pub weight: Option<i32>,
    /// Module exporting the bundled manifests
    pub js: ModuleRef,
}

/// Display metadata of a search provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchProviderMeta {
    /// Label shown to the user
    #[serde(default)]
    pub label: Option<String>,
}

/// `searchProvider` manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProviderManifest {
    /// Globally unique alias
    pub alias: String,
    /// Human readable name
    pub name: String,
    /// Sort weight; higher comes first
    #[serde(default)]
    pub weight: Option<i32>,
    /// Module implementing the provider
    #[serde(default)]
    pub api: Option<ModuleRef>,
    /// Display metadata
    #[serde(default)]
    pub meta: Option<SearchProviderMeta>,
}

/// `modal` manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalManifest {
    /// Globally unique alias, matched by modal tokens
    pub alias: String,
    /// Human readable name
    pub name: String,
    /// Sort weight; higher comes first
    #[serde(default)]
    pub weight: Option<i32>,
    /// Module implementing the modal element
    #[serde(default)]
    pub element: Option<ModuleRef>,
}

/// Display metadata of a workspace action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceActionMeta {
    /// Button label
    #[serde(default)]
    pub label: Option<String>,
    /// Button look, e.g. `primary`
    #[serde(default)]
    pub look: Option<String>,
    /// Button color, e.g. `positive`
    #[serde(default)]
    pub color: Option<String>,
}

/// `workspaceAction` manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceActionManifest {
    /// Globally unique alias
    pub alias: String,
    /// Human readable name
    pub name: String,
    /// Sort weight; higher comes first
    #[serde(default)]
    pub weight: Option<i32>,
    /// Module implementing the action
    #[serde(default)]
    pub api: Option<ModuleRef>,
    /// Display metadata
    #[serde(default)]
    pub meta: WorkspaceActionMeta,
    /// Workspace aliases the action is shown in; empty means all
    #[serde(default)]
    pub workspaces: Vec<String>,
}

/// Any manifest, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Manifest {
    /// See [`EntryPointManifest`]
    EntryPoint(EntryPointManifest),
    /// See [`BundleManifest`]
    Bundle(BundleManifest),
    /// See [`SearchProviderManifest`]
    SearchProvider(SearchProviderManifest),
    /// See [`ModalManifest`]
    Modal(ModalManifest),
    /// See [`WorkspaceActionManifest`]
    WorkspaceAction(WorkspaceActionManifest),
}

impl Manifest {
    /// Kind discriminator.
    pub fn kind(&self) -> ManifestKind {
        match self {
            Self::EntryPoint(_) => ManifestKind::EntryPoint,
            Self::Bundle(_) => ManifestKind::Bundle,
            Self::SearchProvider(_) => ManifestKind::SearchProvider,
            Self::Modal(_) => ManifestKind::Modal,
            Self::WorkspaceAction(_) => ManifestKind::WorkspaceAction,
        }
    }

    /// Globally unique alias.
    pub fn alias(&self) -> &str {
        match self {
            Self::EntryPoint(m) => &m.alias,
            Self::Bundle(m) => &m.alias,
            Self::SearchProvider(m) => &m.alias,
            Self::Modal(m) => &m.alias,
            Self::WorkspaceAction(m) => &m.alias,
        }
    }

    /// Human readable name.
    pub fn name(&self) -> &str {
        match self {
            Self::EntryPoint(m) => &m.name,
            Self::Bundle(m) => &m.name,
            Self::SearchProvider(m) => &m.name,
            Self::Modal(m) => &m.name,
            Self::WorkspaceAction(m) => &m.name,
        }
    }

    /// Sort weight, defaulting to 0.
    pub fn weight(&self) -> i32 {
        let weight = match self {
            Self::EntryPoint(m) => m.weight,
            Self::Bundle(m) => m.weight,
            Self::SearchProvider(m) => m.weight,
            Self::Modal(m) => m.weight,
            Self::WorkspaceAction(m) => m.weight,
        };
        weight.unwrap_or(0)
    }

    /// Code module this manifest references, if any.
    pub fn module(&self) -> Option<&ModuleRef> {
        match self {
            Self::EntryPoint(m) => m.js.as_ref(),
            Self::Bundle(m) => Some(&m.js),
            Self::SearchProvider(m) => m.api.as_ref(),
            Self::Modal(m) => m.element.as_ref(),
            Self::WorkspaceAction(m) => m.api.as_ref(),
        }
    }

    /// Reject manifests the registry cannot index.
    pub fn validate(&self) -> Result<(), ExtensionError> {
        if self.alias().trim().is_empty() {
            return Err(ExtensionError::InvalidManifest {
                alias: self.alias().to_string(),
                reason: "alias must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Manifest>),
    One(Box<Manifest>),
}

/// Parse a JSON document holding one manifest or an array of them.
pub fn parse_manifests(json: &str) -> Result<Vec<Manifest>, ExtensionError> {
    let parsed: OneOrMany = serde_json::from_str(json)?;
    let manifests = match parsed {
        OneOrMany::Many(list) => list,
        OneOrMany::One(one) => vec![*one],
    };
    for manifest in &manifests {
        manifest.validate()?;
    }
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_single_and_array() {
        let one = parse_manifests(r#"{ "type": "modal", "alias": "Umb.Modal.Confirm", "name": "Confirm" }"#)
            .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].kind(), ManifestKind::Modal);
        assert_eq!(one[0].weight(), 0);

        let many = parse_manifests(
            r#"[
                { "type": "bundle", "alias": "My.Bundle", "name": "Bundle", "js": "/bundle.js", "weight": 5 },
                { "type": "workspaceAction", "alias": "Umb.Save", "name": "Save",
                  "meta": { "label": "Save", "look": "primary", "color": "positive" } }
            ]"#,
        )
        .unwrap();
        assert_eq!(many[0].module(), Some(&ModuleRef::new("/bundle.js")));
        assert_eq!(many[0].weight(), 5);
        assert_matches!(&many[1], Manifest::WorkspaceAction(m) if m.meta.look.as_deref() == Some("primary"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = parse_manifests(r#"{ "type": "dashboard", "alias": "x", "name": "x" }"#).unwrap_err();
        assert_matches!(err, ExtensionError::Parse { .. });
    }

    #[test]
    fn test_empty_alias_is_invalid() {
        let err = parse_manifests(r#"{ "type": "entryPoint", "alias": " ", "name": "x" }"#).unwrap_err();
        assert_matches!(err, ExtensionError::InvalidManifest { .. });
    }

    #[test]
    fn test_kind_wire_names_match_serde() {
        for kind in [
            ManifestKind::EntryPoint,
            ManifestKind::Bundle,
            ManifestKind::SearchProvider,
            ManifestKind::Modal,
            ManifestKind::WorkspaceAction,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
