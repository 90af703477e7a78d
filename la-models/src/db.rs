//! Database initialization, connection pooling, and lifecycle management.
//!
//! Uses SQLite (WAL mode by default) with r2d2 connection pooling.
//! Runs integrity checks on startup and applies versioned migrations.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn, error};

use la_core::error::{LaError, LaResult};
use la_core::config::DatabaseConfig;

use crate::schema;
use crate::migrations;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Pooled connection handed out by [`Database::conn`].
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database wrapper providing initialization, pooling, and lifecycle management.
#[derive(Clone)]
pub struct Database {
    pool: Arc<DbPool>,
}

impl Database {
    /// Initialize the database at the given path with the provided configuration.
    ///
    /// This:
    /// 1. Creates the parent directory if needed
    /// 2. Sets up connection pooling with PRAGMA customization
    /// 3. Runs an integrity check if configured
    /// 4. Creates the schema tables
    /// 5. Runs pending migrations
    pub fn init(db_path: &Path, config: &DatabaseConfig) -> LaResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("initializing database at {}", db_path.display());

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(ConnectionCustomizer {
                wal_mode: config.wal_mode,
            }))
            .build(manager)
            .map_err(|e| LaError::Pool(e.to_string()))?;

        let db = Self {
            pool: Arc::new(pool),
        };

        if config.integrity_check_on_startup {
            db.run_integrity_check()?;
        }

        {
            let conn = db.conn()?;
            schema::create_tables(&conn)?;
            migrations::run_migrations(&conn)?;
        }

        info!("database initialized successfully");
        Ok(db)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> LaResult<DbConn> {
        self.pool.get().map_err(|e| LaError::Pool(e.to_string()))
    }

    /// Run a SQLite integrity check.
    pub fn run_integrity_check(&self) -> LaResult<()> {
        let conn = self.conn()?;
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| LaError::Database(e.to_string()))?;

        if result != "ok" {
            error!("database integrity check failed: {result}");
            return Err(LaError::IntegrityCheck(result));
        }

        info!("database integrity check passed");
        Ok(())
    }

    /// Execute a function within a database transaction.
    ///
    /// The transaction is rolled back when `f` returns an error.
    pub fn transaction<T, F>(&self, f: F) -> LaResult<T>
    where
        F: FnOnce(&Connection) -> LaResult<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| LaError::Database(e.to_string()))?;

        let result = f(&tx)?;

        tx.commit()
            .map_err(|e| LaError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Re-apply the secondary index script.
    pub fn ensure_secondary_indexes(&self) -> LaResult<Vec<&'static str>> {
        let conn = self.conn()?;
        schema::apply_secondary_indexes(&conn)
    }

    /// Get database statistics (row counts per table).
    pub fn stats(&self) -> LaResult<DatabaseStats> {
        let conn = self.conn()?;

        let count = |table: &str| -> LaResult<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            conn.query_row(&sql, [], |row| row.get(0))
                .map_err(|e| LaError::Database(e.to_string()))
        };

        Ok(DatabaseStats {
            users: count("users")?,
            reminders: count("reminders")?,
            todos: count("todos")?,
            finances: count("finances")?,
            chat_logs: count("chat_logs")?,
            payments: count("payments")?,
        })
    }

    /// Reset the database by dropping and recreating all tables.
    pub fn reset(&self) -> LaResult<()> {
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
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub users: i64,
    pub reminders: i64,
    pub todos: i64,
    pub finances: i64,
    pub chat_logs: i64,
    pub payments: i64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "users={}, reminders={}, todos={}, finances={}, chat_logs={}, payments={}",
            self.users, self.reminders, self.todos, self.finances, self.chat_logs, self.payments
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
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;",
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
        let path = dir.path().join("data").join("test.db");
        let config = DatabaseConfig::default();
        let db = Database::init(&path, &config).unwrap();
        (db, dir)
    }

    #[test]
    fn test_database_init_creates_parent_dir() {
        let (db, dir) = test_db();
        assert!(dir.path().join("data").join("test.db").exists());
        let stats = db.stats().unwrap();
        assert_eq!(stats.users, 0);
        assert_eq!(stats.reminders, 0);
    }

    #[test]
    fn test_integrity_check() {
        let (db, _dir) = test_db();
        assert!(db.run_integrity_check().is_ok());
    }

    #[test]
    fn test_transaction_commits() {
        let (db, _dir) = test_db();
        let result = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO users (user_id, username) VALUES (?1, ?2)",
                rusqlite::params![1_i64, "alice"],
            )
            .map_err(|e| LaError::Database(e.to_string()))?;
            Ok(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(db.stats().unwrap().users, 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let (db, _dir) = test_db();
        let result: LaResult<()> = db.transaction(|conn| {
            conn.execute("INSERT INTO users (user_id) VALUES (7)", [])
                .map_err(|e| LaError::Database(e.to_string()))?;
            Err(LaError::Validation("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(db.stats().unwrap().users, 0);
    }

    #[test]
    fn test_reopen_existing_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot.db");
        let config = DatabaseConfig::default();
        {
            let db = Database::init(&path, &config).unwrap();
            db.conn()
                .unwrap()
                .execute("INSERT INTO users (user_id) VALUES (5)", [])
                .unwrap();
        }
        let db = Database::init(&path, &config).unwrap();
        assert_eq!(db.stats().unwrap().users, 1);
        assert_eq!(db.ensure_secondary_indexes().unwrap().len(), 4);
    }

    #[test]
    fn test_reset() {
        let (db, _dir) = test_db();
        db.conn()
            .unwrap()
            .execute("INSERT INTO users (user_id) VALUES (9)", [])
            .unwrap();
        db.reset().unwrap();
        assert_eq!(db.stats().unwrap().users, 0);
    }
}
