//! Database schema definitions and table creation.
//!
//! Every entity id is an opaque TEXT key. Cross-entity references are stored
//! as plain strings and matched on equality, so no FOREIGN KEY clauses.

use rusqlite::Connection;
use sh_core::error::{ShError, ShResult};
use tracing::debug;

/// Create all database tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> ShResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| ShError::Database(format!("failed to create schema: {e}")))?;
    debug!("database schema verified");
    Ok(())
}

/// Drop all tables (used for database reset).
pub fn drop_tables(conn: &Connection) -> ShResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS test_results;
         DROP TABLE IF EXISTS notifications;
         DROP TABLE IF EXISTS messages;
         DROP TABLE IF EXISTS appointments;
         DROP TABLE IF EXISTS conditions;
         DROP TABLE IF EXISTS doctors;
         DROP TABLE IF EXISTS users;
         DROP TABLE IF EXISTS settings;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| ShError::Database(format!("failed to drop tables: {e}")))?;
    Ok(())
}

/// Complete SQL schema for all tables.
const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- Accounts (patients, doctors, admins)
CREATE TABLE IF NOT EXISTS users (
    id                  TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    email               TEXT NOT NULL,
    email_normalized    TEXT NOT NULL UNIQUE,
    password_hash       TEXT NOT NULL,
    password_salt       TEXT NOT NULL,
    password_iterations INTEGER NOT NULL,
    role                TEXT NOT NULL,
    active              INTEGER NOT NULL DEFAULT 1,
    created_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);

-- Specialist catalog
CREATE TABLE IF NOT EXISTS doctors (
    id                  TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    specialty           TEXT NOT NULL,
    experience          INTEGER NOT NULL,
    rating              REAL NOT NULL,
    reviews             INTEGER NOT NULL DEFAULT 0,
    image               TEXT,
    availability        TEXT NOT NULL,
    specializations     TEXT NOT NULL DEFAULT '[]',
    next_available      TEXT,
    bio                 TEXT NOT NULL DEFAULT '',
    education           TEXT NOT NULL DEFAULT '[]',
    languages           TEXT NOT NULL DEFAULT '[]',
    consultation_fee    INTEGER NOT NULL,
    first_consult_free  INTEGER NOT NULL DEFAULT 0,
    user_id             TEXT UNIQUE,
    sort_order          INTEGER NOT NULL DEFAULT 0
);

-- Browsable mental-health conditions
CREATE TABLE IF NOT EXISTS conditions (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    icon        TEXT NOT NULL,
    description TEXT NOT NULL,
    sort_order  INTEGER NOT NULL DEFAULT 0
);

-- Appointments
CREATE TABLE IF NOT EXISTS appointments (
    id              TEXT PRIMARY KEY,
    doctor_id       TEXT NOT NULL,
    patient_id      TEXT NOT NULL,
    patient_name    TEXT NOT NULL,
    doctor_name     TEXT NOT NULL,
    date            TEXT NOT NULL,
    time            TEXT NOT NULL,
    type            TEXT NOT NULL,
    status          TEXT NOT NULL,
    meeting_link    TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_appointments_doctor_date ON appointments(doctor_id, date);
CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
-- A slot can only be held by one live appointment.
CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_live_slot
    ON appointments(doctor_id, date, time) WHERE status != 'cancelled';

-- Direct messages between users
CREATE TABLE IF NOT EXISTS messages (
    id              TEXT PRIMARY KEY,
    sender_id       TEXT NOT NULL,
    recipient_id    TEXT NOT NULL,
    content         TEXT NOT NULL,
    timestamp       TEXT NOT NULL,
    read            INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(recipient_id, read);

-- Per-user notifications
CREATE TABLE IF NOT EXISTS notifications (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    title           TEXT NOT NULL,
    message         TEXT NOT NULL,
    timestamp       TEXT NOT NULL,
    read            INTEGER NOT NULL DEFAULT 0,
    type            TEXT NOT NULL,
    related_id      TEXT
);

CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, timestamp);

-- Assessments submitted to a doctor
CREATE TABLE IF NOT EXISTS test_results (
    id              TEXT PRIMARY KEY,
    patient_id      TEXT NOT NULL,
    patient_name    TEXT NOT NULL,
    doctor_id       TEXT NOT NULL,
    answers         TEXT NOT NULL,
    result          TEXT NOT NULL,
    completed_at    TEXT NOT NULL,
    sent_at         TEXT NOT NULL,
    status          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_test_results_doctor ON test_results(doctor_id);
CREATE INDEX IF NOT EXISTS idx_test_results_patient ON test_results(patient_id);

-- Key-value settings (session state)
CREATE TABLE IF NOT EXISTS settings (
    key     TEXT PRIMARY KEY,
    value   TEXT NOT NULL
);
"#;
