//! Key-value settings table.
//!
//! Holds small pieces of client state, such as the signed-in user id,
//! that must survive between CLI invocations.

use rusqlite::{params, Connection};
use sh_core::error::{ShError, ShResult};

/// Accessors for the `settings` table.
pub struct Settings;

impl Settings {
    pub fn get(conn: &Connection, key: &str) -> ShResult<Option<String>> {
        match conn.query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get::<_, String>(0)
        }) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }

    /// Upsert a value.
    pub fn set(conn: &Connection, key: &str, value: &str) -> ShResult<()> {
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e| ShError::Database(e.to_string()))?;
        Ok(())
    }

    /// Returns true if a row was removed.
    pub fn remove(conn: &Connection, key: &str) -> ShResult<bool> {
        let removed = conn
            .execute("DELETE FROM settings WHERE key = ?1", [key])
            .map_err(|e| ShError::Database(e.to_string()))?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_set_overwrites_and_remove() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        assert_eq!(Settings::get(&conn, "session.userId").unwrap(), None);
        Settings::set(&conn, "session.userId", "u1").unwrap();
        Settings::set(&conn, "session.userId", "u2").unwrap();
        assert_eq!(Settings::get(&conn, "session.userId").unwrap().as_deref(), Some("u2"));

        assert!(Settings::remove(&conn, "session.userId").unwrap());
        assert!(!Settings::remove(&conn, "session.userId").unwrap());
    }
}
