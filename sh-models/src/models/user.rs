//! User account entity model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, ErrorCode, Row};
use sh_core::config::AppConfig;
use sh_core::error::{ShError, ShResult};

use super::text_enum;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ShError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            other => Err(ShError::Validation(format!("unknown role: {other}"))),
        }
    }
}

/// A registered account. Password material is kept out of this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub created_at: String,
}

/// Stored password hash parameters for one user.
#[derive(Debug, Clone)]
pub struct PasswordRecord {
    /// Base64 PBKDF2-HMAC-SHA256 output.
    pub hash: String,
    /// Base64 salt.
    pub salt: String,
    pub iterations: u32,
}

/// Columns selected for `User`; never includes password fields.
const USER_COLUMNS: &str = "id, name, email, role, active, created_at";

/// Emails are unique regardless of case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Construct a User from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            role: text_enum(row, "role")?,
            active: row.get::<_, i32>("active")? != 0,
            created_at: row.get("created_at")?,
        })
    }

    pub fn is_patient(&self) -> bool {
        self.role == Role::Patient
    }

    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }

    /// Active and either holding the admin role or listed in
    /// `admin.super_admin_emails`.
    pub fn is_super_admin(&self, config: &AppConfig) -> bool {
        self.active && (self.role == Role::Admin || config.is_super_admin_email(&self.email))
    }

    /// Insert a new user with its password record.
    ///
    /// Returns `EmailTaken` when the normalized email already exists.
    pub fn insert(&self, conn: &Connection, password: &PasswordRecord) -> ShResult<()> {
        let result = conn.execute(
            "INSERT INTO users (
                id, name, email, email_normalized, password_hash, password_salt,
                password_iterations, role, active, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                self.id,
                self.name,
                self.email,
                normalize_email(&self.email),
                password.hash,
                password.salt,
                password.iterations,
                self.role.as_str(),
                self.active as i32,
                self.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(ShError::EmailTaken(self.email.clone()))
            }
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }

    // ─── Static finders ──────────────────────────────────────────────────

    /// Find a user by id.
    pub fn find_by_id(conn: &Connection, id: &str) -> ShResult<Option<Self>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        match conn.query_row(&sql, [id], Self::from_row) {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }

    /// Find a user by email, ignoring case.
    pub fn find_by_email(conn: &Connection, email: &str) -> ShResult<Option<Self>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email_normalized = ?1");
        match conn.query_row(&sql, [normalize_email(email)], Self::from_row) {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }

    /// Load a user together with its password record for login.
    pub fn find_with_password(
        conn: &Connection,
        email: &str,
    ) -> ShResult<Option<(Self, PasswordRecord)>> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash, password_salt, password_iterations
             FROM users WHERE email_normalized = ?1"
        );
        let result = conn.query_row(&sql, [normalize_email(email)], |row| {
            let user = Self::from_row(row)?;
            let record = PasswordRecord {
                hash: row.get("password_hash")?,
                salt: row.get("password_salt")?,
                iterations: row.get("password_iterations")?,
            };
            Ok((user, record))
        });

        match result {
            Ok(pair) => Ok(Some(pair)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }

    /// List users, optionally restricted to one role, oldest first.
    pub fn list(conn: &Connection, role: Option<Role>) -> ShResult<Vec<Self>> {
        let mut sql = format!("SELECT {USER_COLUMNS} FROM users");
        if role.is_some() {
            sql.push_str(" WHERE role = ?1");
        }
        sql.push_str(" ORDER BY created_at ASC, rowid ASC");

        let mut stmt = conn.prepare(&sql).map_err(|e| ShError::Database(e.to_string()))?;
        let rows = match role {
            Some(r) => stmt.query_map([r.as_str()], Self::from_row),
            None => stmt.query_map([], Self::from_row),
        }
        .map_err(|e| ShError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ShError::Database(e.to_string()))
    }

    /// Activate or deactivate an account. Returns false if no such user.
    pub fn set_active(conn: &Connection, id: &str, active: bool) -> ShResult<bool> {
        let changed = conn
            .execute(
                "UPDATE users SET active = ?1 WHERE id = ?2",
                params![active as i32, id],
            )
            .map_err(|e| ShError::Database(e.to_string()))?;
        Ok(changed > 0)
    }
}
