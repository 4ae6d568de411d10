//! Typed event bus for intra-service communication.
//!
//! Backed by a tokio broadcast channel. Services emit an event after every
//! committed state change; subscribers (the CLI's verbose mode, tests, any
//! future push layer) consume them independently.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Application events emitted by the services.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    UserRegistered {
        user_id: String,
        role: String,
    },
    LoggedIn {
        user_id: String,
    },
    LoggedOut {
        user_id: String,
    },
    /// An administrator activated or deactivated an account.
    UserActiveChanged {
        user_id: String,
        active: bool,
    },
    DoctorLinked {
        doctor_id: String,
        user_id: String,
    },
    AppointmentBooked {
        appointment_id: String,
        doctor_id: String,
        patient_id: String,
    },
    AppointmentStatusChanged {
        appointment_id: String,
        from: String,
        to: String,
    },
    MessageSent {
        message_id: String,
        sender_id: String,
        recipient_id: String,
    },
    /// Messages in one conversation were marked read by `reader_id`.
    MessagesRead {
        reader_id: String,
        counterpart_id: String,
        count: usize,
    },
    NotificationCreated {
        notification_id: String,
        user_id: String,
    },
    NotificationsRead {
        user_id: String,
        count: usize,
    },
    AssessmentSubmitted {
        result_id: String,
        patient_id: String,
        doctor_id: String,
    },
    AssessmentReviewed {
        result_id: String,
    },
}

/// Fan-out event bus. Every subscriber receives every event; a receiver
/// that falls behind the channel capacity sees `Lagged` and skips ahead.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AppEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all current subscribers. Never fails.
    pub fn emit(&self, event: AppEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => debug!("event_bus: emitted {label} to {count} subscriber(s)"),
            Err(_) => debug!("event_bus: no subscribers for {label}"),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Stable name of an event variant, for logs and CLI output.
pub fn event_label(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::UserRegistered { .. } => "UserRegistered",
        AppEvent::LoggedIn { .. } => "LoggedIn",
        AppEvent::LoggedOut { .. } => "LoggedOut",
        AppEvent::UserActiveChanged { .. } => "UserActiveChanged",
        AppEvent::DoctorLinked { .. } => "DoctorLinked",
        AppEvent::AppointmentBooked { .. } => "AppointmentBooked",
        AppEvent::AppointmentStatusChanged { .. } => "AppointmentStatusChanged",
        AppEvent::MessageSent { .. } => "MessageSent",
        AppEvent::MessagesRead { .. } => "MessagesRead",
        AppEvent::NotificationCreated { .. } => "NotificationCreated",
        AppEvent::NotificationsRead { .. } => "NotificationsRead",
        AppEvent::AssessmentSubmitted { .. } => "AssessmentSubmitted",
        AppEvent::AssessmentReviewed { .. } => "AssessmentReviewed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(AppEvent::LoggedIn { user_id: "u1".into() });

        match rx.recv().await.unwrap() {
            AppEvent::LoggedIn { user_id } => assert_eq!(user_id, "u1"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_every_subscriber_gets_a_copy() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = AppEvent::AssessmentReviewed { result_id: "t1".into() };
        bus.emit(event.clone());

        assert_eq!(rx1.recv().await.unwrap(), event);
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        bus.emit(AppEvent::LoggedOut { user_id: "u1".into() });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_labels() {
        let event = AppEvent::AppointmentStatusChanged {
            appointment_id: "a".into(),
            from: "pending".into(),
            to: "confirmed".into(),
        };
        assert_eq!(event_label(&event), "AppointmentStatusChanged");
    }
}
