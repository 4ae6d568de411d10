//! Direct messaging between patients and doctors.

use tracing::{debug, info};

use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_models::queries::{self, MessageThread};
use sh_models::{now_timestamp, Database, Message, NotificationType, User};

use crate::event_bus::{AppEvent, EventBus};
use crate::notification::new_notification;
use crate::service::{Service, ServiceState};

/// Build an unread message stamped with the current time.
pub fn new_message(sender_id: &str, recipient_id: &str, content: &str) -> Message {
    Message {
        id: uuid::Uuid::new_v4().to_string(),
        sender_id: sender_id.to_string(),
        recipient_id: recipient_id.to_string(),
        content: content.to_string(),
        timestamp: now_timestamp(),
        read: false,
    }
}

/// Service for sending and reading direct messages.
#[derive(Clone)]
pub struct MessageService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
    config: ConfigHandle,
}

impl MessageService {
    pub fn new(database: Database, event_bus: EventBus, config: ConfigHandle) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
            config,
        }
    }

    /// Send a message. The recipient is notified unless disabled in config.
    pub fn send(&self, sender: &User, recipient_id: &str, content: &str) -> ShResult<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ShError::Validation("message content cannot be empty".into()));
        }
        if recipient_id == sender.id {
            return Err(ShError::Validation("cannot send a message to yourself".into()));
        }

        let notify = self.config.snapshot().notifications.notify_on_message;
        let message = new_message(&sender.id, recipient_id, content);
        let title = format!("New message from {}", sender.name);
        let notification =
            new_notification(recipient_id, &title, content, NotificationType::Message, Some(&sender.id));

        self.database.transaction(|conn| {
            if User::find_by_id(conn, recipient_id)?.is_none() {
                return Err(ShError::UserNotFound(recipient_id.to_string()));
            }
            message.insert(conn)?;
            if notify {
                notification.insert(conn)?;
            }
            Ok(())
        })?;

        debug!("message {} from {} to {recipient_id}", message.id, sender.id);
        self.event_bus.emit(AppEvent::MessageSent {
            message_id: message.id.clone(),
            sender_id: sender.id.clone(),
            recipient_id: recipient_id.to_string(),
        });
        if notify {
            self.event_bus.emit(AppEvent::NotificationCreated {
                notification_id: notification.id,
                user_id: recipient_id.to_string(),
            });
        }
        Ok(message)
    }

    /// Messages between the user and `other_id`, oldest first.
    pub fn conversation(&self, user: &User, other_id: &str) -> ShResult<Vec<Message>> {
        let conn = self.database.conn()?;
        Message::conversation(&conn, &user.id, other_id)
    }

    /// Mark everything `other_id` sent the user as read; returns the count.
    pub fn mark_conversation_read(&self, user: &User, other_id: &str) -> ShResult<usize> {
        let conn = self.database.conn()?;
        let count = Message::mark_read_from(&conn, &user.id, other_id)?;
        if count > 0 {
            self.event_bus.emit(AppEvent::MessagesRead {
                reader_id: user.id.clone(),
                counterpart_id: other_id.to_string(),
                count,
            });
        }
        Ok(count)
    }

    /// One entry per conversation partner, most recent first.
    pub fn threads(&self, user: &User) -> ShResult<Vec<MessageThread>> {
        let conn = self.database.conn()?;
        queries::message_threads(&conn, &user.id)
    }

    pub fn unread_count(&self, user: &User) -> ShResult<i64> {
        let conn = self.database.conn()?;
        Message::unread_count(&conn, &user.id)
    }
}

impl Service for MessageService {
    fn name(&self) -> &str {
        "message"
    }
    fn state(&self) -> ServiceState {
        self.state
    }
    fn init(&mut self) -> ShResult<()> {
        self.state = ServiceState::Running;
        info!("message service initialized");
        Ok(())
    }
    fn shutdown(&mut self) -> ShResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
