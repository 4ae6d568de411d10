//! Direct message entity model.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use sh_core::error::{ShError, ShResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub timestamp: String,
    /// Set once the recipient has opened the conversation.
    pub read: bool,
}

impl Message {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            sender_id: row.get("sender_id")?,
            recipient_id: row.get("recipient_id")?,
            content: row.get("content")?,
            timestamp: row.get("timestamp")?,
            read: row.get::<_, i32>("read")? != 0,
        })
    }

    pub fn insert(&self, conn: &Connection) -> ShResult<()> {
        conn.execute(
            "INSERT INTO messages (id, sender_id, recipient_id, content, timestamp, read)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.id,
                self.sender_id,
                self.recipient_id,
                self.content,
                self.timestamp,
                self.read as i32,
            ],
        )
        .map_err(|e| ShError::Database(e.to_string()))?;
        Ok(())
    }

    /// Every message exchanged between two users, oldest first.
    pub fn conversation(conn: &Connection, a: &str, b: &str) -> ShResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT * FROM messages
                 WHERE (sender_id = ?1 AND recipient_id = ?2)
                    OR (sender_id = ?2 AND recipient_id = ?1)
                 ORDER BY timestamp ASC, rowid ASC",
            )
            .map_err(|e| ShError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![a, b], Self::from_row)
            .map_err(|e| ShError::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ShError::Database(e.to_string()))
    }

    /// Mark everything `sender_id` sent to `recipient_id` as read.
    pub fn mark_read_from(conn: &Connection, recipient_id: &str, sender_id: &str) -> ShResult<usize> {
        conn.execute(
            "UPDATE messages SET read = 1
             WHERE recipient_id = ?1 AND sender_id = ?2 AND read = 0",
            params![recipient_id, sender_id],
        )
        .map_err(|e| ShError::Database(e.to_string()))
    }

    /// Unread messages addressed to a user, across all senders.
    pub fn unread_count(conn: &Connection, user_id: &str) -> ShResult<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE recipient_id = ?1 AND read = 0",
            [user_id],
            |row| row.get(0),
        )
        .map_err(|e| ShError::Database(e.to_string()))
    }
}
