//! Application configuration management.
//!
//! Handles loading, saving, and accessing application configuration including
//! database location, logging, booking rules, authentication parameters and
//! the super-admin list. Configuration is persisted as TOML on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{ShError, ShResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Appointment booking settings.
    #[serde(default)]
    pub booking: BookingConfig,

    /// Account and password settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Administration settings.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Which events produce notification records.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. If empty, uses default location.
    #[serde(default)]
    pub path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Run integrity check on startup.
    #[serde(default = "default_true")]
    pub integrity_check_on_startup: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

/// Booking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Daily consultation slots offered Monday through Saturday.
    #[serde(default = "default_time_slots")]
    pub time_slots: Vec<String>,

    /// How many days ahead the calendar is computed for.
    #[serde(default = "default_booking_window_days")]
    pub booking_window_days: u32,

    /// Base URL for generated video meeting links.
    #[serde(default = "default_meeting_base_url")]
    pub meeting_base_url: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Minimum accepted password length.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// PBKDF2 iteration count used for new password hashes.
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,
}

/// Administration configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Emails of accounts allowed into the admin panel.
    #[serde(default)]
    pub super_admin_emails: Vec<String>,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Create a notification for the recipient of each message.
    #[serde(default = "default_true")]
    pub notify_on_message: bool,

    /// Notify a doctor's account when a patient books or cancels.
    #[serde(default = "default_true")]
    pub notify_on_booking: bool,
}

// Default value functions for serde

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_time_slots() -> Vec<String> {
    constants::DEFAULT_TIME_SLOTS.iter().map(|s| s.to_string()).collect()
}

fn default_booking_window_days() -> u32 {
    30
}

fn default_meeting_base_url() -> String {
    "https://synergihub.meet".to_string()
}

fn default_min_password_length() -> usize {
    6
}

fn default_pbkdf2_iterations() -> u32 {
    constants::DEFAULT_PBKDF2_ITERATIONS
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            wal_mode: true,
            pool_size: default_pool_size(),
            integrity_check_on_startup: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            time_slots: default_time_slots(),
            booking_window_days: default_booking_window_days(),
            meeting_base_url: default_meeting_base_url(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            notify_on_message: true,
            notify_on_booking: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> ShResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> ShResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> ShResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ShError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> ShResult<PathBuf> {
        Ok(Platform::config_dir()?.join("config.toml"))
    }

    /// Get the effective database path, using the configured path or the default.
    pub fn effective_db_path(&self) -> ShResult<PathBuf> {
        if self.database.path.is_empty() {
            Ok(Platform::data_dir()?.join(constants::DB_FILE_NAME))
        } else {
            Ok(PathBuf::from(&self.database.path))
        }
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> ShResult<PathBuf> {
        if self.logging.directory.is_empty() {
            Ok(Platform::data_dir()?.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Reject configurations the services cannot operate with.
    pub fn validate(&self) -> ShResult<()> {
        if self.database.pool_size == 0 {
            return Err(ShError::Config("database.pool_size must be at least 1".into()));
        }
        if self.booking.time_slots.is_empty() {
            return Err(ShError::Config("booking.time_slots must not be empty".into()));
        }
        if self.auth.pbkdf2_iterations == 0 {
            return Err(ShError::Config("auth.pbkdf2_iterations must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether an email belongs to the configured super-admin list.
    pub fn is_super_admin_email(&self, email: &str) -> bool {
        self.admin
            .super_admin_emails
            .iter()
            .any(|e| e.trim().eq_ignore_ascii_case(email.trim()))
    }
}

/// Thread-safe configuration holder for shared access across services.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone the current configuration out of the lock.
    ///
    /// Services are synchronous, so they take a snapshot instead of holding
    /// the async guard.
    pub fn snapshot(&self) -> AppConfig {
        match self.inner.try_read() {
            Ok(guard) => guard.clone(),
            Err(_) => self.inner.blocking_read().clone(),
        }
    }
}
