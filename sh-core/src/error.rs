//! Global error types for SynergiHub.
//!
//! All error categories across the application are unified into a single
//! `ShError` enum with conversions from underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using ShError.
pub type ShResult<T> = Result<T, ShError>;

/// Unified error type covering all error categories in SynergiHub.
#[derive(Error, Debug)]
pub enum ShError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    // -- Database errors --
    /// SQLite database error.
    #[error("database error: {0}")]
    Database(String),

    /// Database migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    // -- Auth errors --
    /// No user is logged in.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Email/password pair did not match a user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The email address is already registered.
    #[error("email already registered: {0}")]
    EmailTaken(String),

    /// The account has been deactivated by an administrator.
    #[error("account is inactive: {0}")]
    AccountInactive(String),

    /// The current user may not perform this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    // -- Domain errors --
    /// Input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// User not found.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Doctor not found in the catalog.
    #[error("doctor not found: {0}")]
    DoctorNotFound(String),

    /// Appointment not found.
    #[error("appointment not found: {0}")]
    AppointmentNotFound(String),

    /// Notification not found.
    #[error("notification not found: {0}")]
    NotificationNotFound(String),

    /// Submitted assessment not found.
    #[error("test result not found: {0}")]
    TestResultNotFound(String),

    /// The requested time slot cannot be booked.
    #[error("slot unavailable: {0}")]
    SlotUnavailable(String),

    /// A status change is not allowed from the current status.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Service errors --
    /// A service failed to initialize.
    #[error("service init error: {0}")]
    ServiceInit(String),

    /// A service operation failed.
    #[error("service error: {0}")]
    Service(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShError {
    /// Whether this error was caused by the caller rather than the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated
                | Self::InvalidCredentials
                | Self::EmailTaken(_)
                | Self::AccountInactive(_)
                | Self::Forbidden(_)
                | Self::Validation(_)
                | Self::UserNotFound(_)
                | Self::DoctorNotFound(_)
                | Self::AppointmentNotFound(_)
                | Self::NotificationNotFound(_)
                | Self::TestResultNotFound(_)
                | Self::SlotUnavailable(_)
                | Self::InvalidTransition { .. }
        )
    }
}

impl From<serde_json::Error> for ShError {
    fn from(e: serde_json::Error) -> Self {
        ShError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for ShError {
    fn from(e: toml::de::Error) -> Self {
        ShError::Config(e.to_string())
    }
}
