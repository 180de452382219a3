use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::token::{ModalSize, ModalType};
use crate::errors::ModalError;

type Outcome = Result<Box<dyn Any + Send>, ModalError>;

struct ModalInner {
    key: String,
    alias: String,
    modal_type: ModalType,
    size: ModalSize,
    data: Option<Arc<dyn Any + Send + Sync>>,
    resolver: Mutex<Option<oneshot::Sender<Outcome>>>,
}

/// A live open modal.
///
/// Clones share the same modal. The modal settles once: the first
/// [`submit`](Self::submit) or [`reject`](Self::reject) wins.
#[derive(Clone)]
pub struct ModalHandle {
    inner: Arc<ModalInner>,
}

impl ModalHandle {
    pub(crate) fn new(
        key: String,
        alias: String,
        modal_type: ModalType,
        size: ModalSize,
        data: Option<Arc<dyn Any + Send + Sync>>,
    ) -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let handle = Self {
            inner: Arc::new(ModalInner {
                key,
                alias,
                modal_type,
                size,
                data,
                resolver: Mutex::new(Some(tx)),
            }),
        };
        (handle, rx)
    }

    /// Key within the modal manager.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Modal element alias.
    pub fn alias(&self) -> &str {
        &self.inner.alias
    }

    /// Presentation.
    pub fn modal_type(&self) -> ModalType {
        self.inner.modal_type
    }

    /// Sidebar width.
    pub fn size(&self) -> ModalSize {
        self.inner.size
    }

    /// The data the modal was opened with, if it is a `D`.
    pub fn data<D: Any + Send + Sync>(&self) -> Option<Arc<D>> {
        let data = Arc::clone(self.inner.data.as_ref()?);
        data.downcast::<D>().ok()
    }

    /// Whether the modal was submitted or rejected.
    pub fn is_settled(&self) -> bool {
        self.inner.resolver.lock().is_none()
    }

    /// Resolve the modal with `value`. Returns `false` if already settled.
    pub fn submit<V: Any + Send>(&self, value: V) -> bool {
        self.settle(Ok(Box::new(value)))
    }

    /// Reject the modal. Returns `false` if already settled.
    pub fn reject(&self) -> bool {
        self.settle(Err(ModalError::Rejected {
            key: self.inner.key.clone(),
        }))
    }

    fn settle(&self, outcome: Outcome) -> bool {
        let Some(tx) = self.inner.resolver.lock().take() else {
            return false;
        };
        tracing::debug!(key = %self.inner.key, submitted = outcome.is_ok(), "modal settled");
        // The opener may have stopped waiting
        let _ = tx.send(outcome);
        true
    }
}

impl PartialEq for ModalHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ModalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalHandle")
            .field("key", &self.inner.key)
            .field("alias", &self.inner.alias)
            .field("type", &self.inner.modal_type)
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// What `open` returns: the handle plus the typed result.
pub struct OpenedModal<V> {
    handle: ModalHandle,
    result: oneshot::Receiver<Outcome>,
    _value: PhantomData<fn() -> V>,
}

impl<V: Any + Send> OpenedModal<V> {
    pub(crate) fn new(handle: ModalHandle, result: oneshot::Receiver<Outcome>) -> Self {
        Self {
            handle,
            result,
            _value: PhantomData,
        }
    }

    /// The live modal.
    pub fn handle(&self) -> &ModalHandle {
        &self.handle
    }

    /// Key of the modal.
    pub fn key(&self) -> &str {
        self.handle.key()
    }

    /// Wait for the modal to settle.
    ///
    /// Fails with [`ModalError::Rejected`] when closed,
    /// [`ModalError::Dismissed`] when every handle was dropped unsettled.
    pub async fn on_submit(self) -> Result<V, ModalError> {
        let key = self.handle.key().to_string();
        drop(self.handle);
        match self.result.await {
            Ok(Ok(value)) => value
                .downcast::<V>()
                .map(|value| *value)
                .map_err(|_| ModalError::ValueType { key }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(ModalError::Dismissed { key }),
        }
    }
}

impl<V> fmt::Debug for OpenedModal<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedModal").field("handle", &self.handle).finish()
    }
}
