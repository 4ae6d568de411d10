//! Cross-table queries for inbox and dashboard views.
//!
//! Single-entity lookups live on the model types. The queries here join or
//! aggregate across tables and return view structs instead of bare models.

use std::collections::BTreeMap;

use serde::Serialize;
use rusqlite::Connection;
use sh_core::error::{ShError, ShResult};

use crate::models::message::Message;

// ─── Message Threads ────────────────────────────────────────────────────────

/// One conversation in a user's inbox.
#[derive(Debug, Clone, Serialize)]
pub struct MessageThread {
    /// The other participant.
    pub counterpart_id: String,
    /// Counterpart's account name, or their id if the account is gone.
    pub counterpart_name: String,
    /// Messages from the counterpart the user has not read yet.
    pub unread_count: i64,
    pub last_message: Message,
}

/// List every conversation a user takes part in, most recent first.
///
/// Picks the latest message per counterpart with a window function and
/// counts unread messages in a correlated subquery.
pub fn message_threads(conn: &Connection, user_id: &str) -> ShResult<Vec<MessageThread>> {
    let sql = "
        WITH involved AS (
            SELECT m.*, m.rowid AS seq,
                   CASE WHEN m.sender_id = ?1 THEN m.recipient_id ELSE m.sender_id END AS peer_id
            FROM messages m
            WHERE m.sender_id = ?1 OR m.recipient_id = ?1
        ),
        ranked AS (
            SELECT i.*,
                   ROW_NUMBER() OVER (PARTITION BY peer_id ORDER BY timestamp DESC, seq DESC) AS rn
            FROM involved i
        )
        SELECT r.id, r.sender_id, r.recipient_id, r.content, r.timestamp, r.read, r.peer_id,
               COALESCE(u.name, r.peer_id) AS peer_name,
               (SELECT COUNT(*) FROM messages x
                 WHERE x.sender_id = r.peer_id AND x.recipient_id = ?1 AND x.read = 0) AS unread_count
        FROM ranked r
        LEFT JOIN users u ON u.id = r.peer_id
        WHERE r.rn = 1
        ORDER BY r.timestamp DESC, r.seq DESC";

    let mut stmt = conn.prepare(sql).map_err(|e| ShError::Database(e.to_string()))?;
    let rows = stmt
        .query_map([user_id], |row| {
            Ok(MessageThread {
                counterpart_id: row.get("peer_id")?,
                counterpart_name: row.get("peer_name")?,
                unread_count: row.get("unread_count")?,
                last_message: Message::from_row(row)?,
            })
        })
        .map_err(|e| ShError::Database(e.to_string()))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| ShError::Database(e.to_string()))
}

// ─── Dashboard Aggregates ───────────────────────────────────────────────────

/// Appointment count per status value.
pub fn appointment_status_counts(conn: &Connection) -> ShResult<BTreeMap<String, i64>> {
    group_counts(conn, "SELECT status, COUNT(*) FROM appointments GROUP BY status")
}

/// Account count per role value.
pub fn user_role_counts(conn: &Connection) -> ShResult<BTreeMap<String, i64>> {
    group_counts(conn, "SELECT role, COUNT(*) FROM users GROUP BY role")
}

/// Number of accounts currently deactivated.
pub fn inactive_user_count(conn: &Connection) -> ShResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM users WHERE active = 0", [], |row| row.get(0))
        .map_err(|e| ShError::Database(e.to_string()))
}

fn group_counts(conn: &Connection, sql: &str) -> ShResult<BTreeMap<String, i64>> {
    let mut stmt = conn.prepare(sql).map_err(|e| ShError::Database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(|e| ShError::Database(e.to_string()))?;
    rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()
        .map_err(|e| ShError::Database(e.to_string()))
}
