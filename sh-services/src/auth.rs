//! Account registration, login, and the persisted session.
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 hashes with a per-user random
//! salt. The signed-in user id lives in the settings table under
//! `session.userId`, so a session survives between CLI invocations.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use lazy_static::lazy_static;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use regex::Regex;
use sha2::Sha256;
use tracing::{debug, info, warn};

use sh_core::config::ConfigHandle;
use sh_core::constants::settings_keys::SESSION_USER_ID;
use sh_core::error::{ShError, ShResult};
use sh_models::{now_timestamp, Database, PasswordRecord, Role, Settings, User};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{Service, ServiceState};

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex");
}

/// Loose structural email check: something@something.tld, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Derive a password record with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> PasswordRecord {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut hash);

    PasswordRecord {
        hash: BASE64.encode(hash),
        salt: BASE64.encode(salt),
        iterations,
    }
}

/// Check a password against a stored record.
pub fn verify_password(password: &str, record: &PasswordRecord) -> bool {
    let (Ok(salt), Ok(expected)) = (BASE64.decode(&record.salt), BASE64.decode(&record.hash)) else {
        warn!("stored password record is not valid base64");
        return false;
    };

    let mut actual = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, record.iterations, &mut actual);

    // Compare every byte so timing does not reveal the mismatch position.
    actual.len() == expected.len()
        && actual.iter().zip(&expected).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

/// Authentication and session management.
#[derive(Clone)]
pub struct AuthService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
    config: ConfigHandle,
}

impl AuthService {
    pub fn new(database: Database, event_bus: EventBus, config: ConfigHandle) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
            config,
        }
    }

    /// Create a patient or doctor account and sign it in.
    pub fn register(&self, name: &str, email: &str, password: &str, role: Role) -> ShResult<User> {
        let config = self.config.snapshot();

        if role == Role::Admin {
            return Err(ShError::Validation(
                "only patient and doctor accounts can be registered".into(),
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ShError::Validation("name is required".into()));
        }
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(ShError::Validation(format!("invalid email address: {email}")));
        }
        if password.chars().count() < config.auth.min_password_length {
            return Err(ShError::Validation(format!(
                "password must be at least {} characters",
                config.auth.min_password_length
            )));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            active: true,
            created_at: now_timestamp(),
        };
        let record = hash_password(password, config.auth.pbkdf2_iterations);

        self.database.transaction(|conn| {
            if User::find_by_email(conn, email)?.is_some() {
                return Err(ShError::EmailTaken(email.to_string()));
            }
            user.insert(conn, &record)?;
            Settings::set(conn, SESSION_USER_ID, &user.id)
        })?;

        info!("registered {} account {}", user.role, user.id);
        self.event_bus.emit(AppEvent::UserRegistered {
            user_id: user.id.clone(),
            role: user.role.to_string(),
        });
        self.event_bus.emit(AppEvent::LoggedIn { user_id: user.id.clone() });
        Ok(user)
    }

    /// Sign in with email and password. Email matching ignores case.
    pub fn login(&self, email: &str, password: &str) -> ShResult<User> {
        let conn = self.database.conn()?;
        let Some((user, record)) = User::find_with_password(&conn, email)? else {
            debug!("login attempt for unknown email");
            return Err(ShError::InvalidCredentials);
        };

        if !verify_password(password, &record) {
            debug!("login attempt with wrong password for {}", user.id);
            return Err(ShError::InvalidCredentials);
        }
        if !user.active {
            return Err(ShError::AccountInactive(user.email));
        }

        Settings::set(&conn, SESSION_USER_ID, &user.id)?;
        info!("user {} logged in", user.id);
        self.event_bus.emit(AppEvent::LoggedIn { user_id: user.id.clone() });
        Ok(user)
    }

    /// Clear the session. Returns false if nobody was signed in.
    pub fn logout(&self) -> ShResult<bool> {
        let conn = self.database.conn()?;
        let previous = Settings::get(&conn, SESSION_USER_ID)?;
        Settings::remove(&conn, SESSION_USER_ID)?;

        match previous {
            Some(user_id) => {
                info!("user {user_id} logged out");
                self.event_bus.emit(AppEvent::LoggedOut { user_id });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The signed-in user, if the session points at an active account.
    ///
    /// A session whose account was deleted or deactivated is cleared.
    pub fn current_user(&self) -> ShResult<Option<User>> {
        let conn = self.database.conn()?;
        let Some(user_id) = Settings::get(&conn, SESSION_USER_ID)? else {
            return Ok(None);
        };

        match User::find_by_id(&conn, &user_id)? {
            Some(user) if user.active => Ok(Some(user)),
            _ => {
                warn!("dropping stale session for {user_id}");
                Settings::remove(&conn, SESSION_USER_ID)?;
                Ok(None)
            }
        }
    }

    /// The signed-in user, or `NotAuthenticated`.
    pub fn require_user(&self) -> ShResult<User> {
        self.current_user()?.ok_or(ShError::NotAuthenticated)
    }

    /// The signed-in user if it has `role`, else `Forbidden`.
    pub fn require_role(&self, role: Role) -> ShResult<User> {
        let user = self.require_user()?;
        if user.role != role {
            return Err(ShError::Forbidden(format!("requires a {role} account")));
        }
        Ok(user)
    }

    pub fn is_super_admin(&self, user: &User) -> bool {
        user.is_super_admin(&self.config.snapshot())
    }

    pub fn require_super_admin(&self) -> ShResult<User> {
        let user = self.require_user()?;
        if !self.is_super_admin(&user) {
            return Err(ShError::Forbidden("administrator access required".into()));
        }
        Ok(user)
    }
}

impl Service for AuthService {
    fn name(&self) -> &str {
        "auth"
    }
    fn state(&self) -> ServiceState {
        self.state
    }
    fn init(&mut self) -> ShResult<()> {
        self.state = ServiceState::Running;
        info!("auth service initialized");
        Ok(())
    }
    fn shutdown(&mut self) -> ShResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
