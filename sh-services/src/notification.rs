//! In-app notifications.
//!
//! Notifications are stored records shown in a user's bell list; there is no
//! desktop popup. Other services create them as side effects of bookings,
//! status changes, messages and submitted assessments.

use chrono::{DateTime, Duration, Local, TimeZone};
use tracing::{debug, info};

use sh_core::error::{ShError, ShResult};
use sh_models::{now_timestamp, Database, Notification, NotificationType, User};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{Service, ServiceState};

/// Build an unread notification stamped with the current time.
pub fn new_notification(
    user_id: &str,
    title: &str,
    message: &str,
    kind: NotificationType,
    related_id: Option<&str>,
) -> Notification {
    Notification {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: title.to_string(),
        message: message.to_string(),
        timestamp: now_timestamp(),
        read: false,
        kind,
        related_id: related_id.map(str::to_string),
    }
}

/// Relative display form of a stored RFC 3339 timestamp.
///
/// Same calendar day as `now` gives "h:mm AM", the previous day gives
/// "Yesterday", anything else "Mon d". Unparseable input is returned as is.
pub fn format_timestamp<Tz>(timestamp: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };
    let local = parsed.with_timezone(&now.timezone());
    let today = now.date_naive();

    if local.date_naive() == today {
        local.format("%-I:%M %p").to_string()
    } else if Some(local.date_naive()) == today.checked_sub_signed(Duration::days(1)) {
        "Yesterday".to_string()
    } else {
        local.format("%b %-d").to_string()
    }
}

/// `format_timestamp` against the local clock, as shown to the user.
pub fn format_local(timestamp: &str) -> String {
    format_timestamp(timestamp, &Local::now())
}

/// Service for creating and reading notifications.
#[derive(Clone)]
pub struct NotificationService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl NotificationService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    /// Store a notification for `user_id` and announce it.
    pub fn create(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationType,
        related_id: Option<&str>,
    ) -> ShResult<Notification> {
        let notification = new_notification(user_id, title, message, kind, related_id);
        let conn = self.database.conn()?;
        notification.insert(&conn)?;

        debug!("notification {} ({}) for {user_id}", notification.id, notification.kind);
        self.event_bus.emit(AppEvent::NotificationCreated {
            notification_id: notification.id.clone(),
            user_id: user_id.to_string(),
        });
        Ok(notification)
    }

    /// The user's notifications, newest first.
    pub fn list(&self, user: &User) -> ShResult<Vec<Notification>> {
        let conn = self.database.conn()?;
        Notification::list_for_user(&conn, &user.id)
    }

    pub fn unread_count(&self, user: &User) -> ShResult<i64> {
        let conn = self.database.conn()?;
        Notification::unread_count(&conn, &user.id)
    }

    /// Mark one of the user's own notifications as read.
    pub fn mark_read(&self, user: &User, notification_id: &str) -> ShResult<()> {
        let conn = self.database.conn()?;
        let notification = Notification::find_by_id(&conn, notification_id)?
            .ok_or_else(|| ShError::NotificationNotFound(notification_id.to_string()))?;
        if notification.user_id != user.id {
            return Err(ShError::Forbidden("notification belongs to another user".into()));
        }

        if Notification::mark_read(&conn, &user.id, notification_id)? && !notification.read {
            self.event_bus.emit(AppEvent::NotificationsRead {
                user_id: user.id.clone(),
                count: 1,
            });
        }
        Ok(())
    }

    /// Mark all of the user's notifications read; returns how many changed.
    pub fn mark_all_read(&self, user: &User) -> ShResult<usize> {
        let conn = self.database.conn()?;
        let count = Notification::mark_all_read(&conn, &user.id)?;
        if count > 0 {
            info!("marked {count} notification(s) read for {}", user.id);
            self.event_bus.emit(AppEvent::NotificationsRead {
                user_id: user.id.clone(),
                count,
            });
        }
        Ok(count)
    }

    pub fn display_time(&self, notification: &Notification) -> String {
        format_local(&notification.timestamp)
    }
}

impl Service for NotificationService {
    fn name(&self) -> &str {
        "notification"
    }
    fn state(&self) -> ServiceState {
        self.state
    }
    fn init(&mut self) -> ShResult<()> {
        self.state = ServiceState::Running;
        info!("notification service initialized");
        Ok(())
    }
    fn shutdown(&mut self) -> ShResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sh_models::Role;

    fn user(id: &str) -> User {
        User {
            id: id.into(),
            name: id.into(),
            email: format!("{id}@example.com"),
            role: Role::Patient,
            active: true,
            created_at: now_timestamp(),
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_format_today() {
        let now = at("2026-10-18T18:00:00Z");
        assert_eq!(format_timestamp("2026-10-18T09:05:00.000Z", &now), "9:05 AM");
        assert_eq!(format_timestamp("2026-10-18T14:30:00.000Z", &now), "2:30 PM");
    }

    #[test]
    fn test_format_yesterday_and_older() {
        let now = at("2026-10-18T08:00:00Z");
        assert_eq!(format_timestamp("2026-10-17T23:59:00.000Z", &now), "Yesterday");
        assert_eq!(format_timestamp("2026-10-03T10:00:00.000Z", &now), "Oct 3");
        assert_eq!(format_timestamp("not a time", &now), "not a time");
    }

    #[test]
    fn test_format_uses_callers_timezone() {
        let ist = chrono::FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let now = at("2026-10-18T10:00:00Z").with_timezone(&ist);
        // 20:00 UTC on the 17th is 01:30 on the 18th in IST.
        assert_eq!(format_timestamp("2026-10-17T20:00:00.000Z", &now), "1:30 AM");
    }

    #[test]
    fn test_display_time_uses_local_clock() {
        let svc = NotificationService::new(Database::in_memory().unwrap(), EventBus::new(16));
        let n = svc
            .create("asha", "Hello", "World", NotificationType::System, None)
            .unwrap();

        let stamped = DateTime::parse_from_rfc3339(&n.timestamp).unwrap().with_timezone(&Local);
        let expected = stamped.format("%-I:%M %p").to_string();
        if stamped.date_naive() == Local::now().date_naive() {
            assert_eq!(svc.display_time(&n), expected);
        }
        assert_eq!(svc.display_time(&n), format_timestamp(&n.timestamp, &Local::now()));
    }

    #[tokio::test]
    async fn test_create_emits_and_lists() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let svc = NotificationService::new(Database::in_memory().unwrap(), bus);
        let asha = user("asha");

        let n = svc
            .create(&asha.id, "Hello", "World", NotificationType::System, None)
            .unwrap();

        match rx.recv().await.unwrap() {
            AppEvent::NotificationCreated { notification_id, .. } => assert_eq!(notification_id, n.id),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(svc.list(&asha).unwrap().len(), 1);
        assert_eq!(svc.unread_count(&asha).unwrap(), 1);
    }

    #[test]
    fn test_cannot_touch_others_notifications() {
        let svc = NotificationService::new(Database::in_memory().unwrap(), EventBus::new(16));
        let asha = user("asha");
        let ravi = user("ravi");
        let n = svc
            .create(&asha.id, "Hello", "World", NotificationType::System, None)
            .unwrap();

        assert!(matches!(svc.mark_read(&ravi, &n.id), Err(ShError::Forbidden(_))));
        assert!(matches!(svc.mark_read(&asha, "missing"), Err(ShError::NotificationNotFound(_))));
        assert_eq!(svc.mark_all_read(&ravi).unwrap(), 0);

        svc.mark_read(&asha, &n.id).unwrap();
        assert_eq!(svc.unread_count(&asha).unwrap(), 0);
    }
}
