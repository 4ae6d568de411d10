//! Integration tests for the data layer.
//!
//! Tests database creation on disk, the seeded catalog, model CRUD against a
//! pooled file database, the live-slot index, dashboard queries, settings,
//! and reset.

mod common;

use chrono::NaiveDate;
use sh_core::constants::DB_SCHEMA_VERSION;
use sh_core::error::ShError;
use sh_models::queries;
use sh_models::{
    now_timestamp, Appointment, AppointmentStatus, ConsultType, Doctor, Message, Notification,
    NotificationType, PasswordRecord, Role, Settings, User,
};

fn user(id: &str, role: Role) -> User {
    User {
        id: id.into(),
        name: id.to_uppercase(),
        email: format!("{id}@example.com"),
        role,
        active: true,
        created_at: now_timestamp(),
    }
}

fn record() -> PasswordRecord {
    PasswordRecord { hash: "aGFzaA==".into(), salt: "c2FsdA==".into(), iterations: 1 }
}

fn appointment(id: &str, date: &str, time: &str, status: AppointmentStatus) -> Appointment {
    Appointment {
        id: id.into(),
        doctor_id: "3".into(),
        patient_id: "asha".into(),
        patient_name: "Asha".into(),
        doctor_name: "Dr. Priya Mehta".into(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        time: time.into(),
        consult_type: ConsultType::Online,
        status,
        meeting_link: None,
        created_at: now_timestamp(),
        updated_at: now_timestamp(),
    }
}

// ---- Initialization ----

#[test]
fn database_init_creates_file_and_wal_mode() {
    let (db, dir) = common::create_test_db();
    assert!(dir.path().join("test.db").exists(), "database file should exist after init");

    let conn = db.conn().unwrap();
    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal_mode.to_lowercase(), "wal", "database should be in WAL mode");
}

#[test]
fn database_init_creates_all_tables_and_records_version() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();

    for table in [
        "schema_version", "users", "doctors", "conditions", "appointments",
        "messages", "notifications", "test_results", "settings",
    ] {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1, "table {table} should exist");
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, DB_SCHEMA_VERSION);
}

#[test]
fn reopening_does_not_reseed_catalog() {
    let (db, dir) = common::create_test_db();
    assert_eq!(db.stats().unwrap().doctors, 6);
    drop(db);

    let reopened = sh_models::Database::init(
        &dir.path().join("test.db"),
        &sh_core::config::DatabaseConfig::default(),
    )
    .unwrap();
    assert_eq!(reopened.stats().unwrap().doctors, 6);
    reopened.run_integrity_check().unwrap();
}

// ---- Catalog ----

#[test]
fn seeded_catalog_has_expected_shape() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();

    let doctors = Doctor::list_all(&conn).unwrap();
    assert_eq!(doctors.len(), 6);
    assert_eq!(doctors[0].name, "Dr. Ananya Sharma");
    assert!(doctors.iter().all(|d| d.user_id.is_none()));
    assert!(doctors.iter().all(|d| d.rating > 4.0 && d.consultation_fee > 0));

    let conditions = sh_models::Condition::list_all(&conn).unwrap();
    assert_eq!(conditions.len(), 12);
}

// ---- Users ----

#[test]
fn user_email_is_unique_case_insensitively() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();

    user("asha", Role::Patient).insert(&conn, &record()).unwrap();
    let dup = User { email: "ASHA@Example.com".into(), ..user("asha2", Role::Patient) };
    assert!(matches!(dup.insert(&conn, &record()), Err(ShError::EmailTaken(_))));

    let found = User::find_by_email(&conn, "  Asha@EXAMPLE.com ").unwrap().unwrap();
    assert_eq!(found.id, "asha");
}

#[test]
fn user_listing_by_role_and_deactivation() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    for (id, role) in [("a", Role::Patient), ("b", Role::Doctor), ("c", Role::Patient)] {
        user(id, role).insert(&conn, &record()).unwrap();
    }

    let patients = User::list(&conn, Some(Role::Patient)).unwrap();
    assert_eq!(patients.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(), vec!["a", "c"]);

    assert!(User::set_active(&conn, "c", false).unwrap());
    assert!(!User::set_active(&conn, "ghost", false).unwrap());
    assert_eq!(queries::inactive_user_count(&conn).unwrap(), 1);
    assert_eq!(queries::user_role_counts(&conn).unwrap().get("patient"), Some(&2));
}

// ---- Appointments ----

#[test]
fn live_slot_index_blocks_double_booking_until_cancelled() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();

    appointment("a1", "2026-10-20", "10:00 AM", AppointmentStatus::Pending)
        .insert(&conn)
        .unwrap();
    let clash = appointment("a2", "2026-10-20", "10:00 AM", AppointmentStatus::Pending);
    assert!(matches!(clash.insert(&conn), Err(ShError::SlotUnavailable(_))));

    Appointment::update_status(&conn, "a1", AppointmentStatus::Cancelled, None, &now_timestamp())
        .unwrap();
    clash.insert(&conn).unwrap();

    let counts = queries::appointment_status_counts(&conn).unwrap();
    assert_eq!(counts.get("cancelled"), Some(&1));
    assert_eq!(counts.get("pending"), Some(&1));
}

#[test]
fn appointment_lists_order_by_date_then_clock_time() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    appointment("late", "2026-10-21", "02:00 PM", AppointmentStatus::Pending).insert(&conn).unwrap();
    appointment("early", "2026-10-21", "09:00 AM", AppointmentStatus::Pending).insert(&conn).unwrap();
    appointment("first", "2026-10-20", "05:00 PM", AppointmentStatus::Confirmed).insert(&conn).unwrap();

    let ids: Vec<String> = Appointment::list_for_doctor(&conn, "3")
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec!["first", "early", "late"]);
    assert_eq!(Appointment::list_for_patient(&conn, "asha").unwrap().len(), 3);
    assert!(Appointment::list_for_patient(&conn, "nobody").unwrap().is_empty());
}

#[test]
fn status_update_keeps_existing_meeting_link() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    appointment("a1", "2026-10-22", "11:00 AM", AppointmentStatus::Pending).insert(&conn).unwrap();

    let ts = now_timestamp();
    Appointment::update_status(&conn, "a1", AppointmentStatus::Confirmed, Some("https://m/1"), &ts).unwrap();
    Appointment::update_status(&conn, "a1", AppointmentStatus::Completed, None, &ts).unwrap();

    let stored = Appointment::find_by_id(&conn, "a1").unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Completed);
    assert_eq!(stored.meeting_link.as_deref(), Some("https://m/1"));
}

// ---- Messages, notifications, settings ----

#[test]
fn message_threads_report_last_message_and_unread() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    for (id, role) in [("asha", Role::Patient), ("ravi", Role::Doctor), ("meena", Role::Doctor)] {
        user(id, role).insert(&conn, &record()).unwrap();
    }

    let send = |id: &str, from: &str, to: &str, text: &str| {
        Message {
            id: id.into(),
            sender_id: from.into(),
            recipient_id: to.into(),
            content: text.into(),
            timestamp: now_timestamp(),
            read: false,
        }
        .insert(&conn)
        .unwrap();
    };
    send("m1", "ravi", "asha", "hello");
    send("m2", "meena", "asha", "hi there");
    send("m3", "asha", "ravi", "thanks");

    let threads = queries::message_threads(&conn, "asha").unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].counterpart_id, "ravi");
    assert_eq!(threads[0].last_message.content, "thanks");
    assert_eq!(threads[0].unread_count, 1);
    assert_eq!(threads[1].counterpart_name, "MEENA");
}

#[test]
fn notifications_are_scoped_to_owner() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    let note = Notification {
        id: "n1".into(),
        user_id: "asha".into(),
        title: "Hi".into(),
        message: "Body".into(),
        timestamp: now_timestamp(),
        read: false,
        kind: NotificationType::System,
        related_id: None,
    };
    note.insert(&conn).unwrap();

    assert!(!Notification::mark_read(&conn, "ravi", "n1").unwrap());
    assert_eq!(Notification::unread_count(&conn, "asha").unwrap(), 1);
    assert!(Notification::mark_read(&conn, "asha", "n1").unwrap());
    assert_eq!(Notification::unread_count(&conn, "asha").unwrap(), 0);
}

#[test]
fn settings_upsert_and_remove() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    Settings::set(&conn, "session.userId", "asha").unwrap();
    Settings::set(&conn, "session.userId", "ravi").unwrap();
    assert_eq!(Settings::get(&conn, "session.userId").unwrap().as_deref(), Some("ravi"));
    assert!(Settings::remove(&conn, "session.userId").unwrap());
    assert!(Settings::get(&conn, "session.userId").unwrap().is_none());
}

#[test]
fn reset_clears_data_and_reseeds() {
    let (db, _dir) = common::create_test_db();
    {
        let conn = db.conn().unwrap();
        user("asha", Role::Patient).insert(&conn, &record()).unwrap();
    }
    assert_eq!(db.stats().unwrap().users, 1);

    db.reset().unwrap();
    let stats = db.stats().unwrap();
    assert_eq!(stats.users, 0);
    assert_eq!(stats.doctors, 6);
}
