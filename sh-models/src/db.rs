//! Database initialization, connection pooling, and lifecycle management.
//!
//! Uses SQLite in WAL mode with r2d2 connection pooling.
//! Runs integrity checks on startup and applies versioned migrations.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{info, warn, error};

use sh_core::error::{ShError, ShResult};
use sh_core::config::DatabaseConfig;

use crate::schema;
use crate::migrations;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database wrapper providing initialization, pooling, and lifecycle management.
#[derive(Clone)]
pub struct Database {
    pool: Arc<DbPool>,
}

impl Database {
    /// Initialize the database at the given path with the provided configuration.
    ///
    /// Creates parent directories, builds the pool, optionally runs an
    /// integrity check, then creates the schema and applies migrations
    /// (which seed the doctor catalog on first run).
    pub fn init(db_path: &Path, config: &DatabaseConfig) -> ShResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("initializing database at {}", db_path.display());

        let manager = SqliteConnectionManager::file(db_path);
        let db = Self::from_manager(manager, config, config.wal_mode)?;

        if config.integrity_check_on_startup {
            db.run_integrity_check()?;
        }

        db.prepare_schema()?;
        info!("database initialized successfully");
        Ok(db)
    }

    /// Open a private in-memory database with the full schema applied.
    ///
    /// The pool is capped at one connection since every in-memory
    /// connection would otherwise see its own empty database.
    pub fn in_memory() -> ShResult<Self> {
        let config = DatabaseConfig {
            pool_size: 1,
            ..DatabaseConfig::default()
        };
        let db = Self::from_manager(SqliteConnectionManager::memory(), &config, false)?;
        db.prepare_schema()?;
        Ok(db)
    }

    fn from_manager(
        manager: SqliteConnectionManager,
        config: &DatabaseConfig,
        wal_mode: bool,
    ) -> ShResult<Self> {
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_customizer(Box::new(ConnectionCustomizer { wal_mode }))
            .build(manager)
            .map_err(|e| ShError::Pool(e.to_string()))?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    fn prepare_schema(&self) -> ShResult<()> {
        let conn = self.conn()?;
        schema::create_tables(&conn)?;
        migrations::run_migrations(&conn)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> ShResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| ShError::Pool(e.to_string()))
    }

    /// Run a SQLite integrity check.
    pub fn run_integrity_check(&self) -> ShResult<()> {
        let conn = self.conn()?;
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| ShError::Database(e.to_string()))?;

        if result != "ok" {
            error!("database integrity check failed: {result}");
            return Err(ShError::IntegrityCheck(result));
        }

        info!("database integrity check passed");
        Ok(())
    }

    /// Execute a function within a database transaction.
    pub fn transaction<T, F>(&self, f: F) -> ShResult<T>
    where
        F: FnOnce(&Connection) -> ShResult<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| ShError::Database(e.to_string()))?;

        let result = f(&tx)?;

        tx.commit()
            .map_err(|e| ShError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get database statistics (row counts per table).
    pub fn stats(&self) -> ShResult<DatabaseStats> {
        let conn = self.conn()?;

        let count = |table: &str| -> ShResult<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            conn.query_row(&sql, [], |row| row.get(0))
                .map_err(|e| ShError::Database(e.to_string()))
        };

        Ok(DatabaseStats {
            users: count("users")?,
            doctors: count("doctors")?,
            appointments: count("appointments")?,
            messages: count("messages")?,
            notifications: count("notifications")?,
            test_results: count("test_results")?,
        })
    }

    /// Reset the database by dropping and recreating all tables.
    pub fn reset(&self) -> ShResult<()> {
        warn!("resetting database - all data will be lost");
        let conn = self.conn()?;
        schema::drop_tables(&conn)?;
        schema::create_tables(&conn)?;
        migrations::run_migrations(&conn)?;
        info!("database reset complete");
        Ok(())
    }
}

/// Database row count statistics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseStats {
    pub users: i64,
    pub doctors: i64,
    pub appointments: i64,
    pub messages: i64,
    pub notifications: i64,
    pub test_results: i64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "users={}, doctors={}, appointments={}, messages={}, notifications={}, test_results={}",
            self.users, self.doctors, self.appointments, self.messages,
            self.notifications, self.test_results
        )
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer {
    wal_mode: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        if self.wal_mode {
            // journal_mode returns a row, so it cannot go through execute().
            conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        }

        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA busy_timeout=5000;",
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> (Database, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let config = DatabaseConfig::default();
        let db = Database::init(&path, &config).unwrap();
        (db, dir)
    }

    #[test]
    fn test_database_init_seeds_catalog() {
        let (db, _dir) = test_db();
        let stats = db.stats().unwrap();
        assert_eq!(stats.users, 0);
        assert_eq!(stats.doctors, 6);
    }

    #[test]
    fn test_integrity_check() {
        let (db, _dir) = test_db();
        assert!(db.run_integrity_check().is_ok());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::in_memory().unwrap();
        let result: ShResult<()> = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO settings (key, value) VALUES ('a', 'b')",
                [],
            )
            .map_err(|e| ShError::Database(e.to_string()))?;
            Err(ShError::Internal("abort".into()))
        });
        assert!(result.is_err());

        let conn = db.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_reset_keeps_catalog() {
        let (db, _dir) = test_db();
        db.reset().unwrap();
        assert_eq!(db.stats().unwrap().doctors, 6);
    }
}
