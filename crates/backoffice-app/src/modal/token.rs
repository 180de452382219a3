use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a modal is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalType {
    /// Centered dialog
    #[default]
    Dialog,
    /// Panel sliding in from the side
    Sidebar,
}

impl FromStr for ModalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dialog" => Ok(Self::Dialog),
            "sidebar" => Ok(Self::Sidebar),
            other => Err(format!("unknown modal type '{other}'")),
        }
    }
}

impl fmt::Display for ModalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dialog => "dialog",
            Self::Sidebar => "sidebar",
        })
    }
}

/// Sidebar width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalSize {
    /// Narrow
    Small,
    /// Default width
    #[default]
    Medium,
    /// Wide
    Large,
    /// Whole viewport
    Full,
}

impl FromStr for ModalSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown modal size '{other}'")),
        }
    }
}

/// Presentation overrides. Unset fields fall through to the next layer:
/// caller arguments, then the token, then the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalConfig {
    /// Caller-chosen key; a random one is generated when unset
    pub key: Option<String>,
    /// Presentation
    pub modal_type: Option<ModalType>,
    /// Sidebar width
    pub size: Option<ModalSize>,
}

impl ModalConfig {
    /// Fields of `self`, falling back to `fallback` where unset.
    pub(crate) fn or(&self, fallback: &ModalConfig) -> ModalConfig {
        ModalConfig {
            key: self.key.clone().or_else(|| fallback.key.clone()),
            modal_type: self.modal_type.or(fallback.modal_type),
            size: self.size.or(fallback.size),
        }
    }
}

/// Typed identity of a modal.
///
/// `D` is the data the modal is opened with, `V` the value it is submitted
/// with.
pub struct ModalToken<D, V> {
    alias: String,
    modal: ModalConfig,
    default_data: Option<D>,
    _value: PhantomData<fn() -> V>,
}

impl<D, V> ModalToken<D, V> {
    /// Token for the modal element registered under `alias`.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            modal: ModalConfig::default(),
            default_data: None,
            _value: PhantomData,
        }
    }

    /// Presentation used unless the caller overrides it.
    pub fn with_modal(mut self, modal: ModalConfig) -> Self {
        self.modal = modal;
        self
    }

    /// Data used when the caller passes none.
    pub fn with_default_data(mut self, data: D) -> Self {
        self.default_data = Some(data);
        self
    }

    /// Modal element alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Token-level presentation.
    pub fn modal(&self) -> &ModalConfig {
        &self.modal
    }

    /// Token-level data.
    pub fn default_data(&self) -> Option<&D> {
        self.default_data.as_ref()
    }
}

impl<D: fmt::Debug, V> fmt::Debug for ModalToken<D, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalToken")
            .field("alias", &self.alias)
            .field("modal", &self.modal)
            .field("default_data", &self.default_data)
            .finish()
    }
}

/// Arguments of a single `open` call.
#[derive(Debug, Clone)]
pub struct ModalArgs<D> {
    /// Data replacing the token's default data
    pub data: Option<D>,
    /// Presentation overrides
    pub modal: ModalConfig,
}

impl<D> Default for ModalArgs<D> {
    fn default() -> Self {
        Self {
            data: None,
            modal: ModalConfig::default(),
        }
    }
}

impl<D> ModalArgs<D> {
    /// Arguments carrying `data`.
    pub fn with_data(data: D) -> Self {
        Self {
            data: Some(data),
            modal: ModalConfig::default(),
        }
    }

    /// Open under a fixed key, replacing any modal with that key.
    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.modal.key = Some(key.into());
        self
    }
}
