use std::any::Any;
use std::sync::Arc;

use backoffice_core::{ArrayState, ContextToken, Observable};
use uuid::Uuid;

use super::handle::{ModalHandle, OpenedModal};
use super::token::{ModalArgs, ModalToken};
use crate::config::{BackofficeConfig, ModalDefaults};

/// Context token of the modal manager.
pub const MODAL_MANAGER_CONTEXT: ContextToken<ModalManagerContext> = ContextToken::new("UmbModalManagerContext");

/// Keyed collection of open modals.
pub struct ModalManagerContext {
    modals: ArrayState<ModalHandle, String>,
    defaults: ModalDefaults,
}

impl ModalManagerContext {
    /// Manager falling back to `defaults` for unset presentation.
    pub fn new(defaults: ModalDefaults) -> Self {
        Self {
            modals: ArrayState::new(Vec::new(), |m: &ModalHandle| m.key().to_string()),
            defaults,
        }
    }

    /// Manager configured from `config.modals`.
    pub fn from_config(config: &BackofficeConfig) -> Self {
        Self::new(config.modals.clone())
    }

    /// Open modals, in opening order.
    pub fn modals(&self) -> Observable<Vec<ModalHandle>> {
        self.modals.as_observable()
    }

    /// Snapshot of the open modals.
    pub fn get_modals(&self) -> Vec<ModalHandle> {
        self.modals.get_value()
    }

    /// Open modal under `key`.
    pub fn get(&self, key: &str) -> Option<ModalHandle> {
        self.modals.get_one(&key.to_string())
    }

    /// Open a modal and return immediately.
    ///
    /// A modal already open under the same key is replaced in place. Await
    /// [`OpenedModal::on_submit`] for the value.
    pub fn open<D, V>(&self, token: &ModalToken<D, V>, args: ModalArgs<D>) -> OpenedModal<V>
    where
        D: Any + Clone + Send + Sync,
        V: Any + Send,
    {
        let config = args.modal.or(token.modal());
        let key = config.key.unwrap_or_else(|| Uuid::new_v4().to_string());
        let data = args
            .data
            .or_else(|| token.default_data().cloned())
            .map(|data| Arc::new(data) as Arc<dyn Any + Send + Sync>);
        let (handle, result) = ModalHandle::new(
            key,
            token.alias().to_string(),
            config.modal_type.unwrap_or(self.defaults.default_type),
            config.size.unwrap_or(self.defaults.default_size),
            data,
        );
        tracing::debug!(key = handle.key(), alias = token.alias(), "modal opened");
        self.modals.append_one(handle.clone());
        OpenedModal::new(handle, result)
    }

    /// Reject the modal under `key`, leaving it in the list.
    pub fn close(&self, key: &str) -> bool {
        match self.get(key) {
            Some(handle) => handle.reject(),
            None => {
                tracing::debug!(key, "close of unknown modal");
                false
            }
        }
    }

    /// Drop the modal under `key` from the list.
    pub fn remove(&self, key: &str) -> bool {
        self.modals.remove_one(&key.to_string())
    }
}

impl std::fmt::Debug for ModalManagerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalManagerContext")
            .field("open", &self.modals.len())
            .field("defaults", &self.defaults)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ModalError;
    use crate::modal::{ModalConfig, ModalSize, ModalType};

    #[derive(Debug, Clone, PartialEq)]
    struct PickerData {
        multiple: bool,
    }

    fn picker() -> ModalToken<PickerData, Vec<String>> {
        ModalToken::new("Umb.Modal.TreePicker")
            .with_modal(ModalConfig {
                modal_type: Some(ModalType::Sidebar),
                size: Some(ModalSize::Small),
                ..ModalConfig::default()
            })
            .with_default_data(PickerData { multiple: false })
    }

    #[tokio::test]
    async fn test_open_and_submit() {
        let manager = ModalManagerContext::new(ModalDefaults::default());
        let opened = manager.open(&picker(), ModalArgs::default());
        let handle = opened.handle().clone();

        assert_eq!(handle.modal_type(), ModalType::Sidebar);
        assert_eq!(handle.size(), ModalSize::Small);
        assert_eq!(handle.data::<PickerData>().as_deref(), Some(&PickerData { multiple: false }));
        assert_eq!(manager.get_modals().len(), 1);

        handle.submit(vec!["a".to_string()]);
        assert_eq!(opened.on_submit().await, Ok(vec!["a".to_string()]));
    }

    #[tokio::test]
    async fn test_close_rejects_only_that_modal() {
        let manager = ModalManagerContext::new(ModalDefaults::default());
        let first = manager.open(&picker(), ModalArgs::default());
        let second = manager.open(&picker(), ModalArgs::with_data(PickerData { multiple: true }));
        let first_key = first.key().to_string();

        assert!(manager.close(&first_key));
        assert!(!manager.close("missing"));
        assert_eq!(manager.get_modals().len(), 2);
        assert!(!second.handle().is_settled());

        assert_eq!(
            first.on_submit().await,
            Err(ModalError::Rejected { key: first_key.clone() })
        );
        assert!(manager.remove(&first_key));
        assert_eq!(manager.get_modals().len(), 1);
        assert_eq!(
            second.handle().data::<PickerData>().as_deref(),
            Some(&PickerData { multiple: true })
        );
    }

    #[test]
    fn test_same_key_replaces_in_place() {
        let manager = ModalManagerContext::new(ModalDefaults {
            default_type: ModalType::Sidebar,
            default_size: ModalSize::Large,
        });
        let plain: ModalToken<(), ()> = ModalToken::new("Umb.Modal.Plain");
        manager.open(&plain, ModalArgs::default().keyed("a"));
        manager.open(&plain, ModalArgs::default().keyed("b"));
        let replacement = manager.open(&plain, ModalArgs::default().keyed("a"));

        let keys: Vec<String> = manager.get_modals().iter().map(|m| m.key().to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(manager.get("a").as_ref(), Some(replacement.handle()));
        assert_eq!(replacement.handle().modal_type(), ModalType::Sidebar);
        assert_eq!(replacement.handle().size(), ModalSize::Large);
    }
}
