//! Shared test utilities for integration tests.

#![allow(dead_code)]

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use sh_core::config::{AppConfig, ConfigHandle, DatabaseConfig};
use sh_models::{Database, Role, User};
use sh_services::auth::AuthService;
use sh_services::event_bus::EventBus;
use sh_services::registry::ServiceRegistry;
use tempfile::TempDir;

/// Create a temporary database with full schema and migrations applied.
/// Returns the Database and the TempDir (must be held alive for the duration of the test).
pub fn create_test_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("test.db");
    let config = DatabaseConfig::default();
    let db = Database::init(&path, &config).expect("failed to init test database");
    (db, dir)
}

/// Default configuration with cheap password hashing.
pub fn create_test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.pbkdf2_iterations = 1_000;
    config.admin.super_admin_emails = vec!["admin@synergihub.test".into()];
    config
}

pub fn create_test_config_handle() -> ConfigHandle {
    ConfigHandle::new(create_test_config())
}

/// Create an EventBus with a small buffer suitable for tests.
pub fn create_test_event_bus() -> EventBus {
    EventBus::new(64)
}

/// A registry over a fresh temp database with every service registered.
pub fn create_test_registry() -> (ServiceRegistry, TempDir) {
    let (db, dir) = create_test_db();
    let mut registry = ServiceRegistry::new(create_test_config_handle(), db);
    registry.register_all();
    (registry, dir)
}

/// Register an account through the auth service, leaving it signed in.
pub fn register(auth: &AuthService, name: &str, email: &str, role: Role) -> User {
    auth.register(name, email, "secret123", role)
        .expect("failed to register test user")
}

/// Accounts used by the end-to-end tests.
pub struct Cast {
    pub patient: User,
    /// Linked to catalog doctor "1" (Dr. Ananya Sharma).
    pub doctor: User,
    pub admin: User,
}

pub fn seed_cast(registry: &ServiceRegistry) -> Cast {
    let auth = registry.auth();
    let patient = register(&auth, "Asha Rao", "asha@example.com", Role::Patient);
    let doctor = register(&auth, "Ananya Sharma", "ananya@example.com", Role::Doctor);
    registry
        .directory()
        .link_account("1", &doctor)
        .expect("failed to link doctor account");
    let admin = register(&auth, "Site Admin", "admin@synergihub.test", Role::Patient);
    auth.logout().expect("failed to log out");
    Cast { patient, doctor, admin }
}

/// A working day (not Sunday) at least `min_days` from today.
pub fn workday(min_days: i64) -> NaiveDate {
    let mut date = Local::now().date_naive() + Duration::days(min_days);
    while date.weekday() == Weekday::Sun {
        date += Duration::days(1);
    }
    date
}
