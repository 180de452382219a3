//! Typed lookup keys for provided contexts.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed key under which a host provides a service of type `T`.
///
/// Two tokens with the same alias address the same slot. A provider whose
/// instance has a different type, or fails the token's discriminator, is
/// skipped and the search continues towards the root.
///
/// Tokens are `const`-constructible so they can live in statics:
///
/// ```rust
/// use backoffice_core::context::ContextToken;
///
/// struct Notifications;
/// pub const NOTIFICATION_CONTEXT: ContextToken<Notifications> =
///     ContextToken::new("UmbNotificationContext");
/// ```
pub struct ContextToken<T: ?Sized + 'static> {
    alias: &'static str,
    discriminator: Option<fn(&T) -> bool>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + 'static> ContextToken<T> {
    /// Token accepting any provider of `T` under `alias`.
    pub const fn new(alias: &'static str) -> Self {
        Self {
            alias,
            discriminator: None,
            _marker: PhantomData,
        }
    }

    /// Token accepting only instances for which `discriminator` holds.
    pub const fn with_discriminator(alias: &'static str, discriminator: fn(&T) -> bool) -> Self {
        Self {
            alias,
            discriminator: Some(discriminator),
            _marker: PhantomData,
        }
    }

    /// Slot name.
    pub fn alias(&self) -> &'static str {
        self.alias
    }

    /// Whether `instance` qualifies for this token.
    pub fn accepts(&self, instance: &T) -> bool {
        self.discriminator.map_or(true, |accept| accept(instance))
    }
}

impl<T: ?Sized + 'static> Clone for ContextToken<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized + 'static> Copy for ContextToken<T> {}

impl<T: ?Sized + 'static> fmt::Debug for ContextToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextToken")
            .field("alias", &self.alias)
            .field("discriminated", &self.discriminator.is_some())
            .finish()
    }
}

impl<T: ?Sized + 'static> fmt::Display for ContextToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Workspace {
        fn entity_type(&self) -> &str;
    }

    struct Doc;
    impl Workspace for Doc {
        fn entity_type(&self) -> &str {
            "document"
        }
    }

    struct Media;
    impl Workspace for Media {
        fn entity_type(&self) -> &str {
            "media"
        }
    }

    const ANY_WORKSPACE: ContextToken<dyn Workspace> = ContextToken::new("UmbWorkspaceContext");
    const DOC_WORKSPACE: ContextToken<dyn Workspace> =
        ContextToken::with_discriminator("UmbWorkspaceContext", |w| w.entity_type() == "document");

    #[test]
    fn test_discriminator_narrows_accepted_instances() {
        assert!(ANY_WORKSPACE.accepts(&Media));
        assert!(DOC_WORKSPACE.accepts(&Doc));
        assert!(!DOC_WORKSPACE.accepts(&Media));
        assert_eq!(ANY_WORKSPACE.alias(), DOC_WORKSPACE.alias());
    }
}
