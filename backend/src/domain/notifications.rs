//! Notification center: a capped, newest-first list of user-facing events.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Badge, Report, ReportStatus, Reward, User, Worker};

/// Maximum number of notifications kept per user.
pub const NOTIFICATION_CAPACITY: usize = 20;

/// Category shown next to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Status,
    Reward,
    Badge,
    System,
}

/// One inbox entry shown to a citizen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

/// Something worth telling a user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
}

impl NotificationEvent {
    pub fn report_submitted(report: &Report) -> Self {
        Self {
            title: "Report submitted".to_owned(),
            message: format!("Your report \"{}\" is now under review.", report.title()),
            kind: NotificationKind::Status,
        }
    }

    pub fn status_changed(report: &Report, status: ReportStatus) -> Self {
        Self {
            title: "Status update".to_owned(),
            message: format!("\"{}\" has been updated to {status}.", report.title()),
            kind: NotificationKind::Status,
        }
    }

    pub fn worker_dispatched(report: &Report, worker: &Worker) -> Self {
        Self {
            title: "Field deployment".to_owned(),
            message: format!(
                "{} has been dispatched to resolve \"{}\".",
                worker.name,
                report.title()
            ),
            kind: NotificationKind::Status,
        }
    }

    pub fn badge_unlocked(badge: &Badge) -> Self {
        Self {
            title: "Achievement unlocked".to_owned(),
            message: format!("You've earned the {} badge.", badge.title),
            kind: NotificationKind::Badge,
        }
    }

    pub fn reward_redeemed(reward: &Reward) -> Self {
        Self {
            title: "Reward redeemed".to_owned(),
            message: format!(
                "You've redeemed \"{}\". Details are on their way to your inbox.",
                reward.title
            ),
            kind: NotificationKind::Reward,
        }
    }

    pub fn session_established(user: &User) -> Self {
        Self {
            title: "Session established".to_owned(),
            message: format!("Welcome back, {}.", user.first_name()),
            kind: NotificationKind::System,
        }
    }
}

/// Newest-first notification list holding at most
/// [`NOTIFICATION_CAPACITY`] entries.
///
/// # Examples
/// ```
/// use backend::domain::{NotificationCenter, NotificationEvent, NotificationKind};
/// use chrono::Utc;
///
/// let mut center = NotificationCenter::default();
/// let event = NotificationEvent {
///     title: "Hello".into(),
///     message: "World".into(),
///     kind: NotificationKind::System,
/// };
/// center.emit(event, "ntf-1".into(), Utc::now());
/// assert_eq!(center.unread_count(), 1);
/// center.mark_all_read();
/// assert_eq!(center.unread_count(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Notification>", into = "Vec<Notification>")]
pub struct NotificationCenter {
    items: VecDeque<Notification>,
}

impl NotificationCenter {
    /// Store an unread notification at the front, evicting the oldest entry
    /// once the list is full.
    pub fn emit(
        &mut self,
        event: NotificationEvent,
        id: String,
        now: DateTime<Utc>,
    ) -> Notification {
        let notification = Notification {
            id,
            title: event.title,
            message: event.message,
            timestamp: now,
            read: false,
            kind: event.kind,
        };
        self.items.push_front(notification.clone());
        self.items.truncate(NOTIFICATION_CAPACITY);
        notification
    }

    pub fn mark_all_read(&mut self) {
        for item in &mut self.items {
            item.read = true;
        }
    }

    /// Entries not yet marked read.
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|item| !item.read).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl From<Vec<Notification>> for NotificationCenter {
    fn from(mut value: Vec<Notification>) -> Self {
        value.truncate(NOTIFICATION_CAPACITY);
        Self {
            items: value.into(),
        }
    }
}

impl From<NotificationCenter> for Vec<Notification> {
    fn from(value: NotificationCenter) -> Self {
        value.items.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T09:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    fn system(title: &str) -> NotificationEvent {
        NotificationEvent {
            title: title.to_owned(),
            message: "body".to_owned(),
            kind: NotificationKind::System,
        }
    }

    #[rstest]
    fn newest_first(now: DateTime<Utc>) {
        let mut center = NotificationCenter::default();
        center.emit(system("first"), "ntf-1".to_owned(), now);
        center.emit(system("second"), "ntf-2".to_owned(), now);

        let titles: Vec<_> = center.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, ["second", "first"]);
    }

    #[rstest]
    fn evicts_oldest_beyond_capacity(now: DateTime<Utc>) {
        let mut center = NotificationCenter::default();
        for index in 0..25 {
            center.emit(system(&format!("n{index}")), format!("ntf-{index}"), now);
        }

        assert_eq!(center.len(), NOTIFICATION_CAPACITY);
        let newest = center.iter().next().map(|item| item.id.clone());
        let oldest = center.iter().last().map(|item| item.id.clone());
        assert_eq!(newest.as_deref(), Some("ntf-24"));
        assert_eq!(oldest.as_deref(), Some("ntf-5"));
    }

    #[rstest]
    fn mark_all_read_keeps_order(now: DateTime<Utc>) {
        let mut center = NotificationCenter::default();
        center.emit(system("a"), "ntf-a".to_owned(), now);
        center.emit(system("b"), "ntf-b".to_owned(), now);
        let before: Vec<_> = center.iter().map(|item| item.id.clone()).collect();

        center.mark_all_read();

        let after: Vec<_> = center.iter().map(|item| item.id.clone()).collect();
        assert_eq!(before, after);
        assert!(center.iter().all(|item| item.read));
    }

    #[rstest]
    fn deserialising_enforces_capacity(now: DateTime<Utc>) {
        let mut source = NotificationCenter::default();
        for index in 0..20 {
            source.emit(system("x"), format!("ntf-{index}"), now);
        }
        let mut stored: Vec<Notification> = source.into();
        stored.extend(stored.clone());

        let center = NotificationCenter::from(stored);
        assert_eq!(center.len(), NOTIFICATION_CAPACITY);
    }
}
