//! Per-user notification entity model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use sh_core::error::{ShError, ShResult};

use super::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Message,
    Appointment,
    Assessment,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Message => "message",
            NotificationType::Appointment => "appointment",
            NotificationType::Assessment => "assessment",
            NotificationType::System => "system",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = ShError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(NotificationType::Message),
            "appointment" => Ok(NotificationType::Appointment),
            "assessment" => Ok(NotificationType::Assessment),
            "system" => Ok(NotificationType::System),
            other => Err(ShError::Validation(format!("unknown notification type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub timestamp: String,
    pub read: bool,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Id of the appointment, sender or test result this refers to.
    pub related_id: Option<String>,
}

impl Notification {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            message: row.get("message")?,
            timestamp: row.get("timestamp")?,
            read: row.get::<_, i32>("read")? != 0,
            kind: text_enum(row, "type")?,
            related_id: row.get("related_id")?,
        })
    }

    pub fn insert(&self, conn: &Connection) -> ShResult<()> {
        conn.execute(
            "INSERT INTO notifications (id, user_id, title, message, timestamp, read, type, related_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.id,
                self.user_id,
                self.title,
                self.message,
                self.timestamp,
                self.read as i32,
                self.kind.as_str(),
                self.related_id,
            ],
        )
        .map_err(|e| ShError::Database(e.to_string()))?;
        Ok(())
    }

    /// A user's notifications, newest first.
    pub fn list_for_user(conn: &Connection, user_id: &str) -> ShResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT * FROM notifications WHERE user_id = ?1
                 ORDER BY timestamp DESC, rowid DESC",
            )
            .map_err(|e| ShError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([user_id], Self::from_row)
            .map_err(|e| ShError::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ShError::Database(e.to_string()))
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> ShResult<Option<Self>> {
        match conn.query_row("SELECT * FROM notifications WHERE id = ?1", [id], Self::from_row) {
            Ok(n) => Ok(Some(n)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }

    /// Mark one notification read. Only matches rows owned by `user_id`.
    pub fn mark_read(conn: &Connection, user_id: &str, id: &str) -> ShResult<bool> {
        let changed = conn
            .execute(
                "UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )
            .map_err(|e| ShError::Database(e.to_string()))?;
        Ok(changed > 0)
    }

    pub fn mark_all_read(conn: &Connection, user_id: &str) -> ShResult<usize> {
        conn.execute(
            "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0",
            [user_id],
        )
        .map_err(|e| ShError::Database(e.to_string()))
    }

    pub fn unread_count(conn: &Connection, user_id: &str) -> ShResult<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
            [user_id],
            |row| row.get(0),
        )
        .map_err(|e| ShError::Database(e.to_string()))
    }
}
