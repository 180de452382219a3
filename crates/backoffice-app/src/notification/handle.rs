//! Notification records: displayed handles and deferred fragments.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationColor {
    /// Neutral
    #[default]
    Default,
    /// Success
    Positive,
    /// Needs attention
    Warning,
    /// Failure
    Danger,
}

impl NotificationColor {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Positive => "positive",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl fmt::Display for NotificationColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text content of a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Body text
    pub message: String,
    /// Optional title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
}

impl NotificationData {
    /// Data with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            headline: None,
        }
    }

    /// Data with a headline and a message.
    pub fn with_headline(headline: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            headline: Some(headline.into()),
        }
    }
}

/// Options accepted by `peek` and `stay`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationOptions {
    /// Content
    pub data: NotificationData,
    /// Overrides the configured peek duration (ignored by `stay`)
    pub duration: Option<Duration>,
    /// Custom element rendering the notification
    pub element_name: Option<String>,
}

impl From<NotificationData> for NotificationOptions {
    fn from(data: NotificationData) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

/// A displayed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationHandle {
    key: String,
    color: NotificationColor,
    data: NotificationData,
    element_name: Option<String>,
    duration: Option<Duration>,
    opened_at: Instant,
}

impl NotificationHandle {
    pub(crate) fn open(
        color: NotificationColor,
        options: NotificationOptions,
        duration: Option<Duration>,
    ) -> Self {
        Self {
            key: Uuid::new_v4().to_string(),
            color,
            data: options.data,
            element_name: options.element_name,
            duration,
            opened_at: Instant::now(),
        }
    }

    /// Unique key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Color.
    pub fn color(&self) -> NotificationColor {
        self.color
    }

    /// Content.
    pub fn data(&self) -> &NotificationData {
        &self.data
    }

    /// Custom element, if any.
    pub fn element_name(&self) -> Option<&str> {
        self.element_name.as_deref()
    }

    /// Auto-dismiss delay; `None` for persistent notifications.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// When the notification was opened.
    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    /// When the notification dismisses itself, if it does.
    pub fn expires_at(&self) -> Option<Instant> {
        self.duration.map(|d| self.opened_at + d)
    }

    /// Whether the notification should be gone at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at().is_some_and(|at| now >= at)
    }
}

/// A deferred notification payload waiting in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFragment {
    /// Identity; duplicates with equal content stay distinct
    pub id: Uuid,
    /// Category the fragment is compiled under
    pub category: String,
    /// Color
    pub color: NotificationColor,
    /// Content
    pub data: NotificationData,
}

/// Overrides applied by `peek_compilation`.
///
/// A forced `color` puts every fragment of the category into a single
/// notification. A forced `message` or `headline` replaces the joined text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationOverride {
    /// Force one color for the whole category
    pub color: Option<NotificationColor>,
    /// Replace the compiled message
    pub message: Option<String>,
    /// Replace the compiled headline
    pub headline: Option<String>,
    /// Duration of the opened notifications
    pub duration: Option<Duration>,
    /// Custom element of the opened notifications
    pub element_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let handle = NotificationHandle::open(
            NotificationColor::Positive,
            NotificationData::message("saved").into(),
            Some(Duration::from_secs(6)),
        );
        let opened = handle.opened_at();
        assert!(!handle.is_expired(opened + Duration::from_secs(5)));
        assert!(handle.is_expired(opened + Duration::from_secs(6)));

        let persistent =
            NotificationHandle::open(NotificationColor::Danger, NotificationData::message("x").into(), None);
        assert_eq!(persistent.expires_at(), None);
        assert!(!persistent.is_expired(opened + Duration::from_secs(3600)));
    }

    #[test]
    fn test_color_serde() {
        let json = serde_json::to_string(&NotificationColor::Danger).unwrap();
        assert_eq!(json, "\"danger\"");
        let parsed: NotificationColor = serde_json::from_str("\"positive\"").unwrap();
        assert_eq!(parsed, NotificationColor::Positive);
    }
}
