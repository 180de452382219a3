//! Modal manager
//!
//! `open` registers a [`ModalHandle`] and returns at once. The opener awaits
//! the typed result while the UI side submits or rejects through the handle.
//!
//! # Usage
//!
//! ```rust,ignore
//! let modals = host.require(&MODAL_MANAGER_CONTEXT)?;
//! let opened = modals.open(&CONFIRM_MODAL, ModalArgs::with_data(ConfirmData { headline }));
//! match opened.on_submit().await {
//!     Ok(value) => apply(value),
//!     Err(ModalError::Rejected { .. }) => {}
//!     Err(err) => return Err(err.into()),
//! }
//! ```

mod handle;
mod manager;
mod token;

pub use handle::{ModalHandle, OpenedModal};
pub use manager::{ModalManagerContext, MODAL_MANAGER_CONTEXT};
pub use token::{ModalArgs, ModalConfig, ModalSize, ModalToken, ModalType};
