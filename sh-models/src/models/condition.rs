//! Mental-health conditions shown on the browse screen.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use sh_core::error::{ShError, ShResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
}

impl Condition {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            icon: row.get("icon")?,
            description: row.get("description")?,
        })
    }

    pub fn insert(&self, conn: &Connection, sort_order: i64) -> ShResult<()> {
        conn.execute(
            "INSERT INTO conditions (id, name, icon, description, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![self.id, self.name, self.icon, self.description, sort_order],
        )
        .map_err(|e| ShError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn list_all(conn: &Connection) -> ShResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT id, name, icon, description FROM conditions ORDER BY sort_order ASC")
            .map_err(|e| ShError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], Self::from_row)
            .map_err(|e| ShError::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ShError::Database(e.to_string()))
    }
}
