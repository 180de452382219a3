use std::time::{Duration, Instant};

use backoffice_core::{ArrayState, ContextToken, LifecycleToken, Observable};
use uuid::Uuid;

use super::handle::{
    CompilationOverride, NotificationColor, NotificationData, NotificationFragment, NotificationHandle,
    NotificationOptions,
};
use crate::config::BackofficeConfig;

/// Context token of the notification manager.
pub const NOTIFICATION_CONTEXT: ContextToken<NotificationContext> = ContextToken::new("UmbNotificationContext");

/// Displayed notifications plus categorized fragments waiting to be shown.
pub struct NotificationContext {
    notifications: ArrayState<NotificationHandle, String>,
    fragments: ArrayState<NotificationFragment, Uuid>,
    peek_duration: Duration,
}

impl NotificationContext {
    /// Manager whose `peek` notifications last `peek_duration`.
    pub fn new(peek_duration: Duration) -> Self {
        Self {
            notifications: ArrayState::new(Vec::new(), |n: &NotificationHandle| n.key().to_string()),
            fragments: ArrayState::new(Vec::new(), |f: &NotificationFragment| f.id),
            peek_duration,
        }
    }

    /// Manager configured from `config.notifications`.
    pub fn from_config(config: &BackofficeConfig) -> Self {
        Self::new(config.peek_duration())
    }

    /// Displayed notifications, oldest first.
    pub fn notifications(&self) -> Observable<Vec<NotificationHandle>> {
        self.notifications.as_observable()
    }

    /// Snapshot of the displayed notifications.
    pub fn get_notifications(&self) -> Vec<NotificationHandle> {
        self.notifications.get_value()
    }

    /// Pending fragments of every category.
    pub fn fragments(&self) -> Observable<Vec<NotificationFragment>> {
        self.fragments.as_observable()
    }

    /// Open a notification that dismisses itself after the peek duration.
    pub fn peek(&self, color: NotificationColor, options: impl Into<NotificationOptions>) -> NotificationHandle {
        let options = options.into();
        let duration = options.duration.unwrap_or(self.peek_duration);
        self.open(NotificationHandle::open(color, options, Some(duration)))
    }

    /// Open a notification that stays until closed.
    pub fn stay(&self, color: NotificationColor, options: impl Into<NotificationOptions>) -> NotificationHandle {
        self.open(NotificationHandle::open(color, options.into(), None))
    }

    fn open(&self, handle: NotificationHandle) -> NotificationHandle {
        tracing::debug!(key = handle.key(), color = %handle.color(), "notification opened");
        self.notifications.append_one(handle.clone());
        handle
    }

    /// Remove a displayed notification.
    pub fn close(&self, key: &str) -> bool {
        self.notifications.remove_one(&key.to_string())
    }

    /// Store a fragment under `category` without displaying anything.
    pub fn append(&self, color: NotificationColor, data: NotificationData, category: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.fragments.append_one(NotificationFragment {
            id,
            category: category.into(),
            color,
            data,
        });
        id
    }

    /// Pending fragments, optionally limited to one category.
    pub fn get_available_fragments(&self, category: Option<&str>) -> Vec<NotificationFragment> {
        let all = self.fragments.get_value();
        match category {
            Some(category) => all.into_iter().filter(|f| f.category == category).collect(),
            None => all,
        }
    }

    /// Discard every pending fragment of `category`.
    pub fn remove_category(&self, category: &str) -> bool {
        self.fragments.filter(|f| f.category != category)
    }

    /// Open the fragments of `category` as one peek notification per color.
    ///
    /// Fragments are drained atomically. Same-color fragments are merged in
    /// arrival order, joining their messages and headlines with a line
    /// break. Returns the opened notifications, empty if the category had no
    /// fragments.
    pub fn peek_compilation(
        &self,
        category: &str,
        override_with: Option<&CompilationOverride>,
    ) -> Vec<NotificationHandle> {
        let drained = self.fragments.take_where(|f| f.category == category);
        if drained.is_empty() {
            return Vec::new();
        }
        let empty = CompilationOverride::default();
        let forced = override_with.unwrap_or(&empty);

        let mut groups: Vec<(NotificationColor, Vec<String>, Vec<String>)> = Vec::new();
        for fragment in drained {
            let color = forced.color.unwrap_or(fragment.color);
            let index = match groups.iter().position(|(c, _, _)| *c == color) {
                Some(index) => index,
                None => {
                    groups.push((color, Vec::new(), Vec::new()));
                    groups.len() - 1
                }
            };
            let (_, messages, headlines) = &mut groups[index];
            if !fragment.data.message.is_empty() {
                messages.push(fragment.data.message);
            }
            if let Some(headline) = fragment.data.headline.filter(|h| !h.is_empty()) {
                headlines.push(headline);
            }
        }

        tracing::debug!(category, groups = groups.len(), "compiling notification fragments");
        groups
            .into_iter()
            .map(|(color, messages, headlines)| {
                let message = forced.message.clone().unwrap_or_else(|| messages.join("\n"));
                let headline = forced
                    .headline
                    .clone()
                    .or_else(|| (!headlines.is_empty()).then(|| headlines.join("\n")));
                let options = NotificationOptions {
                    data: NotificationData { message, headline },
                    duration: forced.duration,
                    element_name: forced.element_name.clone(),
                };
                self.peek(color, options)
            })
            .collect()
    }

    /// Close every notification whose duration elapsed by `now`.
    ///
    /// Returns the keys that were closed.
    pub fn dismiss_expired(&self, now: Instant) -> Vec<String> {
        self.notifications
            .take_where(|n| n.is_expired(now))
            .into_iter()
            .map(|n| n.key().to_string())
            .collect()
    }

    /// Dismiss expired notifications every `tick` until `lifecycle` fires.
    pub async fn run_auto_dismiss(&self, lifecycle: LifecycleToken, tick: Duration) {
        loop {
            if lifecycle.run_until_cancelled(tokio::time::sleep(tick)).await.is_none() {
                break;
            }
            let closed = self.dismiss_expired(Instant::now());
            if !closed.is_empty() {
                tracing::debug!(count = closed.len(), "notifications auto-dismissed");
            }
        }
    }
}

impl std::fmt::Debug for NotificationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationContext")
            .field("notifications", &self.notifications.len())
            .field("fragments", &self.fragments.len())
            .field("peek_duration", &self.peek_duration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> NotificationContext {
        NotificationContext::new(Duration::from_secs(6))
    }

    #[test]
    fn test_peek_and_stay_durations() {
        let ctx = context();
        let peeked = ctx.peek(NotificationColor::Positive, NotificationData::message("Saved"));
        let stayed = ctx.stay(
            NotificationColor::Danger,
            NotificationOptions {
                data: NotificationData::message("Broken"),
                duration: Some(Duration::from_secs(1)),
                element_name: None,
            },
        );
        assert_eq!(peeked.duration(), Some(Duration::from_secs(6)));
        assert_eq!(stayed.duration(), None);
        assert_eq!(ctx.get_notifications().len(), 2);

        assert!(ctx.close(peeked.key()));
        assert!(!ctx.close(peeked.key()));
        assert_eq!(ctx.get_notifications(), vec![stayed]);
    }

    #[test]
    fn test_fragments_by_category() {
        let ctx = context();
        ctx.append(NotificationColor::Danger, NotificationData::message("a"), "save");
        ctx.append(NotificationColor::Danger, NotificationData::message("a"), "save");
        ctx.append(NotificationColor::Warning, NotificationData::message("b"), "publish");

        assert_eq!(ctx.get_available_fragments(Some("save")).len(), 2);
        assert_eq!(ctx.get_available_fragments(None).len(), 3);

        assert!(ctx.remove_category("save"));
        assert!(ctx.get_available_fragments(Some("save")).is_empty());
        assert_eq!(ctx.get_available_fragments(None).len(), 1);
        assert!(ctx.get_notifications().is_empty());
    }

    #[test]
    fn test_compilation_groups_by_color() {
        let ctx = context();
        ctx.append(
            NotificationColor::Danger,
            NotificationData::with_headline("Name", "A"),
            "save-errors",
        );
        ctx.append(NotificationColor::Danger, NotificationData::message("B"), "save-errors");
        ctx.append(NotificationColor::Warning, NotificationData::message("C"), "save-errors");
        ctx.append(NotificationColor::Danger, NotificationData::message("other"), "elsewhere");

        let opened = ctx.peek_compilation("save-errors", None);

        assert_eq!(opened.len(), 2);
        assert_eq!(opened[0].color(), NotificationColor::Danger);
        assert_eq!(opened[0].data().message, "A\nB");
        assert_eq!(opened[0].data().headline.as_deref(), Some("Name"));
        assert_eq!(opened[1].color(), NotificationColor::Warning);
        assert_eq!(opened[1].data().message, "C");
        assert_eq!(opened[1].data().headline, None);
        assert!(ctx.get_available_fragments(Some("save-errors")).is_empty());
        assert_eq!(ctx.get_available_fragments(Some("elsewhere")).len(), 1);
        assert_eq!(ctx.get_notifications().len(), 2);
    }

    #[test]
    fn test_compilation_override() {
        let ctx = context();
        ctx.append(NotificationColor::Danger, NotificationData::message("A"), "c");
        ctx.append(NotificationColor::Warning, NotificationData::message("B"), "c");

        let forced = CompilationOverride {
            color: Some(NotificationColor::Default),
            headline: Some("Could not save".into()),
            duration: Some(Duration::from_secs(2)),
            ..CompilationOverride::default()
        };
        let opened = ctx.peek_compilation("c", Some(&forced));

        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].color(), NotificationColor::Default);
        assert_eq!(opened[0].data().message, "A\nB");
        assert_eq!(opened[0].data().headline.as_deref(), Some("Could not save"));
        assert_eq!(opened[0].duration(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_compilation_of_empty_category_opens_nothing() {
        let ctx = context();
        assert!(ctx.peek_compilation("none", None).is_empty());
        assert!(ctx.get_notifications().is_empty());
    }

    #[test]
    fn test_dismiss_expired() {
        let ctx = NotificationContext::new(Duration::from_millis(100));
        let short = ctx.peek(NotificationColor::Default, NotificationData::message("short"));
        let sticky = ctx.stay(NotificationColor::Default, NotificationData::message("sticky"));

        let later = short.opened_at() + Duration::from_millis(150);
        assert_eq!(ctx.dismiss_expired(later), vec![short.key().to_string()]);
        assert_eq!(ctx.get_notifications(), vec![sticky]);
        assert!(ctx.dismiss_expired(later).is_empty());
    }

    #[tokio::test]
    async fn test_auto_dismiss_loop_stops_on_cancel() {
        let ctx = NotificationContext::new(Duration::from_millis(10));
        ctx.peek(NotificationColor::Default, NotificationData::message("bye"));
        let lifecycle = LifecycleToken::new();
        let stopper = lifecycle.clone();

        let run = ctx.run_auto_dismiss(lifecycle, Duration::from_millis(5));
        let stop = async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            stopper.cancel();
        };
        tokio::join!(run, stop);

        assert!(ctx.get_notifications().is_empty());
    }
}
