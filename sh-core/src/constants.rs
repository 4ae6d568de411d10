//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "SynergiHub";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory name used under the platform data/config dirs.
pub const APP_DIR_NAME: &str = "SynergiHub";

/// Default database file name.
pub const DB_FILE_NAME: &str = "synergihub.db";

/// Log file prefix for the rolling appender.
pub const LOG_FILE_NAME: &str = "synergihub.log";

/// Database schema version.
pub const DB_SCHEMA_VERSION: i32 = 1;

/// PBKDF2 iterations for password hashes.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// Consultation slots offered on working days.
pub const DEFAULT_TIME_SLOTS: &[&str] = &[
    "09:00 AM", "10:00 AM", "11:00 AM",
    "02:00 PM", "03:00 PM", "04:00 PM", "05:00 PM",
];

/// Doctor availability labels used by the catalog.
pub mod availability {
    pub const ONLINE_ONLY: &str = "Online Only";
    pub const IN_PERSON_ONLY: &str = "In-person Only";
    pub const ONLINE_AND_IN_PERSON: &str = "Online & In-person";

    /// All valid availability labels.
    pub const ALL: &[&str] = &[ONLINE_ONLY, IN_PERSON_ONLY, ONLINE_AND_IN_PERSON];
}

/// Settings keys persisted in the key-value table.
pub mod settings_keys {
    /// Id of the user currently logged in on this device.
    pub const SESSION_USER_ID: &str = "session.userId";
}
