//! SynergiHub Models - database schema, entity models, migrations and queries.
//!
//! This crate owns all persistence: SQLite initialization and pooling,
//! the entity models, the versioned migrations that seed the specialist
//! catalog, and the cross-table queries used by inbox and admin views.

pub mod db;
pub mod schema;
pub mod models;
pub mod queries;
pub mod migrations;

// Re-export key types
pub use db::{Database, DatabaseStats, DbPool};
pub use models::now_timestamp;
pub use models::user::{normalize_email, PasswordRecord, Role, User};
pub use models::doctor::Doctor;
pub use models::condition::Condition;
pub use models::appointment::{Appointment, AppointmentStatus, ConsultType};
pub use models::message::Message;
pub use models::notification::{Notification, NotificationType};
pub use models::assessment::{Answers, AssessmentResult, CategoryScores, Severity};
pub use models::test_result::{TestResult, TestResultStatus};
pub use models::settings::Settings;
pub use queries::MessageThread;
