//! End-to-end flows across services.
//!
//! Booking through confirmation and completion, patient cancellation,
//! messaging threads, and assessment delivery and review, each checked
//! through the records and events a user would see.

mod common;

use std::time::Duration;

use sh_core::error::ShError;
use sh_models::{Answers, AppointmentStatus, ConsultType, NotificationType, Severity, TestResultStatus};
use sh_services::appointment::{long_date, AppointmentTab};
use sh_services::assessment::{evaluate, AssessmentSession};
use sh_services::event_bus::AppEvent;
use sh_services::matching;

async fn next_event(rx: &mut tokio::sync::broadcast::Receiver<AppEvent>) -> AppEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event bus closed")
}

// ---- Appointments ----

#[tokio::test]
async fn e2e_book_confirm_complete() {
    let (registry, _dir) = common::create_test_registry();
    let cast = common::seed_cast(&registry);
    let mut rx = registry.event_bus().subscribe();
    let appointments = registry.appointments();
    let date = common::workday(4);

    // 1. Patient books.
    let appt = appointments
        .book(&cast.patient, "1", date, "10:00 AM", ConsultType::Online)
        .unwrap();
    assert!(matches!(next_event(&mut rx).await, AppEvent::AppointmentBooked { .. }));
    assert!(matches!(
        next_event(&mut rx).await,
        AppEvent::NotificationCreated { user_id, .. } if user_id == cast.doctor.id
    ));

    let doctor_view = appointments.list_for_doctor(&cast.doctor, AppointmentTab::Upcoming).unwrap();
    assert_eq!(doctor_view.len(), 1);
    assert_eq!(doctor_view[0].patient_name, "Asha Rao");

    // 2. Doctor confirms with a generated link.
    let confirmed = appointments.confirm_with_meeting_link(&cast.doctor, &appt.id).unwrap();
    let link = confirmed.meeting_link.clone().unwrap();
    assert!(link.starts_with(&format!("https://synergihub.meet/{}/", cast.doctor.id)));
    assert_eq!(
        next_event(&mut rx).await,
        AppEvent::AppointmentStatusChanged {
            appointment_id: appt.id.clone(),
            from: "pending".into(),
            to: "confirmed".into(),
        }
    );

    let when = format!("{} at 10:00 AM", long_date(date));
    let patient_notes = registry.notifications().list(&cast.patient).unwrap();
    assert_eq!(patient_notes[0].title, "Appointment Confirmed");
    assert_eq!(
        patient_notes[0].message,
        format!("Dr. Ananya Sharma has confirmed your appointment on {when}")
    );
    assert_eq!(patient_notes[0].kind, NotificationType::Appointment);
    assert_eq!(patient_notes[0].related_id.as_deref(), Some(appt.id.as_str()));

    let convo = registry.messages().conversation(&cast.patient, &cast.doctor.id).unwrap();
    assert_eq!(convo.len(), 1);
    assert_eq!(
        convo[0].content,
        format!("I've confirmed our appointment on {when}. Here's the meeting link: {link}")
    );

    // 3. Doctor completes.
    appointments
        .update_status(&cast.doctor, &appt.id, AppointmentStatus::Completed, None)
        .unwrap();
    assert!(appointments.list_for_patient(&cast.patient, AppointmentTab::Upcoming).unwrap().is_empty());
    let past = appointments.list_for_patient(&cast.patient, AppointmentTab::Past).unwrap();
    assert_eq!(past[0].meeting_link.as_deref(), Some(link.as_str()));

    // A completed appointment is terminal.
    assert!(matches!(
        appointments.update_status(&cast.doctor, &appt.id, AppointmentStatus::Cancelled, None),
        Err(ShError::InvalidTransition { .. })
    ));
}

#[test]
fn e2e_doctor_cancellation_frees_slot_and_messages_patient() {
    let (registry, _dir) = common::create_test_registry();
    let cast = common::seed_cast(&registry);
    let appointments = registry.appointments();
    let date = common::workday(5);

    let appt = appointments
        .book(&cast.patient, "1", date, "03:00 PM", ConsultType::InPerson)
        .unwrap();
    appointments
        .update_status(&cast.doctor, &appt.id, AppointmentStatus::Cancelled, None)
        .unwrap();

    let convo = registry.messages().conversation(&cast.patient, &cast.doctor.id).unwrap();
    assert_eq!(
        convo[0].content,
        format!(
            "I need to cancel our appointment scheduled for {} at 03:00 PM. Please book another time that works for you.",
            long_date(date)
        )
    );
    assert!(registry.scheduling().is_slot_free("1", date, "03:00 PM").unwrap());
    assert_eq!(
        appointments.list_for_doctor(&cast.doctor, AppointmentTab::Cancelled).unwrap().len(),
        1
    );
}

#[test]
fn e2e_booking_notification_can_be_disabled() {
    let (db, _dir) = common::create_test_db();
    let mut config = common::create_test_config();
    config.notifications.notify_on_booking = false;
    let registry = sh_services::ServiceRegistry::new(sh_core::config::ConfigHandle::new(config), db);
    let cast = common::seed_cast(&registry);

    registry
        .appointments()
        .book(&cast.patient, "1", common::workday(2), "09:00 AM", ConsultType::Online)
        .unwrap();
    assert_eq!(registry.notifications().unread_count(&cast.doctor).unwrap(), 0);
}

// ---- Messaging ----

#[test]
fn e2e_message_threads_and_read_state() {
    let (registry, _dir) = common::create_test_registry();
    let cast = common::seed_cast(&registry);
    let messages = registry.messages();

    messages.send(&cast.patient, &cast.doctor.id, "Hello doctor").unwrap();
    messages.send(&cast.patient, &cast.doctor.id, "Are you available?").unwrap();
    messages.send(&cast.doctor, &cast.patient.id, "Yes, book a slot.").unwrap();

    let threads = messages.threads(&cast.doctor).unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].counterpart_name, "Asha Rao");
    assert_eq!(threads[0].unread_count, 2);
    assert_eq!(threads[0].last_message.content, "Yes, book a slot.");

    let doctor_notes = registry.notifications().list(&cast.doctor).unwrap();
    assert_eq!(doctor_notes.len(), 2);
    assert!(doctor_notes.iter().all(|n| n.title == "New message from Asha Rao"));

    assert_eq!(messages.mark_conversation_read(&cast.doctor, &cast.patient.id).unwrap(), 2);
    assert_eq!(messages.unread_count(&cast.doctor).unwrap(), 0);
    assert_eq!(registry.notifications().mark_all_read(&cast.doctor).unwrap(), 2);
}

// ---- Assessments ----

fn walk_session(values: [u8; 10]) -> Answers {
    let mut session = AssessmentSession::new();
    session.start(chrono::Utc::now());
    let mut finished = None;
    for value in values {
        session.answer(value).unwrap();
        finished = session.next().unwrap();
    }
    let result = finished.expect("session should finish after the last question");
    assert!(session.is_complete());
    result.answers
}

#[test]
fn e2e_assessment_to_doctor_review() {
    let (registry, _dir) = common::create_test_registry();
    let cast = common::seed_cast(&registry);

    let answers = walk_session([3, 3, 2, 2, 1, 1, 3, 1, 0, 0]);
    let result = evaluate(&answers);
    assert_eq!(result.total_score, 16);
    assert_eq!(result.severity, Severity::ModeratelySevere);
    assert_eq!(result.primary_concerns, vec!["Depression", "Anxiety"]);

    let doctors = registry.directory().list().unwrap();
    let relevant: Vec<&str> = matching::relevant_doctors(&result, &doctors)
        .into_iter()
        .map(|d| d.id.as_str())
        .collect();
    assert!(relevant.contains(&"1"));

    let assessments = registry.assessments();
    let sent = assessments.send_to_doctor(&cast.patient, "1", &answers, None).unwrap();
    assert_eq!(sent.status, TestResultStatus::Pending);

    let notes = registry.notifications().list(&cast.doctor).unwrap();
    assert_eq!(notes[0].title, "New Assessment Received");
    assert_eq!(
        notes[0].message,
        "Asha Rao has sent you an assessment (severity: moderately severe)"
    );

    let inbox = assessments.list_for_doctor(&cast.doctor).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].result.total_score, 16);

    let reviewed = assessments.mark_reviewed(&cast.doctor, &sent.id).unwrap();
    assert_eq!(reviewed.status, TestResultStatus::Reviewed);
    assert_eq!(
        assessments.list_for_patient(&cast.patient).unwrap()[0].status,
        TestResultStatus::Reviewed
    );

    // Patients cannot read a doctor's inbox.
    assert!(matches!(
        assessments.list_for_doctor(&cast.patient),
        Err(ShError::Forbidden(_))
    ));
}

#[test]
fn e2e_admin_overview() {
    let (registry, _dir) = common::create_test_registry();
    let cast = common::seed_cast(&registry);
    registry
        .appointments()
        .book(&cast.patient, "1", common::workday(2), "11:00 AM", ConsultType::Online)
        .unwrap();

    let admin = registry.admin();
    let stats = admin.stats(&cast.admin).unwrap();
    assert_eq!(stats.users_by_role.get("patient"), Some(&2));
    assert_eq!(stats.users_by_role.get("doctor"), Some(&1));
    assert_eq!(stats.appointments_by_status.get("pending"), Some(&1));
    assert_eq!(admin.list_appointments(&cast.admin).unwrap().len(), 1);
    assert!(matches!(admin.stats(&cast.patient), Err(ShError::Forbidden(_))));
}
