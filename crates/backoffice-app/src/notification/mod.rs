//! Notification manager
//!
//! Two collections: displayed notifications and categorized fragments.
//! Fragments accumulate silently (one per failed field, say) and are later
//! compiled into one notification per color.
//!
//! # Usage
//!
//! ```rust,ignore
//! let notifications = host.require(&NOTIFICATION_CONTEXT)?;
//! notifications.append(NotificationColor::Danger, NotificationData::message("Name is required"), "save");
//! notifications.append(NotificationColor::Danger, NotificationData::message("Alias is taken"), "save");
//! let opened = notifications.peek_compilation("save", None);
//! assert_eq!(opened.len(), 1);
//! ```

mod context;
mod handle;

pub use context::{NotificationContext, NOTIFICATION_CONTEXT};
pub use handle::{
    CompilationOverride, NotificationColor, NotificationData, NotificationFragment, NotificationHandle,
    NotificationOptions,
};
