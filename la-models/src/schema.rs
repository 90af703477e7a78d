//! Database schema definitions, table creation, and the secondary index script.
//!
//! The base tables carry only their primary keys. Per-user lookup indexes
//! live in a separate script so they can be (re)applied to an existing
//! database on their own; every statement is guarded with `IF NOT EXISTS`.

use rusqlite::Connection;
use la_core::error::{LaError, LaResult};
use tracing::info;

/// Create all database tables if they do not exist.
pub fn create_tables(conn: &Connection) -> LaResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| LaError::Database(format!("failed to create schema: {e}")))?;
    info!("database schema verified");
    Ok(())
}

/// Drop all tables (used for database reset).
pub fn drop_tables(conn: &Connection) -> LaResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS users;
         DROP TABLE IF EXISTS payments;
         DROP TABLE IF EXISTS reminders;
         DROP TABLE IF EXISTS todos;
         DROP TABLE IF EXISTS finances;
         DROP TABLE IF EXISTS chat_logs;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| LaError::Database(format!("failed to drop tables: {e}")))?;
    Ok(())
}

/// A non-unique composite index created by the secondary index script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryIndex {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

impl SecondaryIndex {
    /// The guarded DDL statement for this index.
    pub fn ddl(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {}({})",
            self.name,
            self.table,
            self.columns.join(", ")
        )
    }
}

/// Per-user lookup indexes. Order-independent.
pub const SECONDARY_INDEXES: &[SecondaryIndex] = &[
    SecondaryIndex {
        name: "idx_reminders_user_due",
        table: "reminders",
        columns: &["user_id", "due_date"],
    },
    SecondaryIndex {
        name: "idx_finances_user_created",
        table: "finances",
        columns: &["user_id", "created_at"],
    },
    SecondaryIndex {
        name: "idx_chat_logs_user_created",
        table: "chat_logs",
        columns: &["user_id", "created_at"],
    },
    SecondaryIndex {
        name: "idx_payments_user_created",
        table: "payments",
        columns: &["user_id", "created_at"],
    },
];

/// Apply the secondary index script. Safe to run any number of times.
///
/// Returns the names of the indexes that are guaranteed to exist afterwards.
/// A missing table surfaces as a database error.
pub fn apply_secondary_indexes(conn: &Connection) -> LaResult<Vec<&'static str>> {
    let mut applied = Vec::with_capacity(SECONDARY_INDEXES.len());
    for index in SECONDARY_INDEXES {
        conn.execute_batch(&index.ddl())
            .map_err(|e| LaError::Database(format!("failed to create {}: {e}", index.name)))?;
        applied.push(index.name);
    }
    info!("secondary indexes ensured: {}", applied.join(", "));
    Ok(applied)
}

/// The secondary index script as standalone SQL text.
pub fn secondary_index_script() -> String {
    SECONDARY_INDEXES
        .iter()
        .map(|i| format!("{};\n", i.ddl()))
        .collect()
}

/// Names of the explicit (non-autoindex) indexes on a table.
pub fn list_indexes(conn: &Connection, table: &str) -> LaResult<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'index' AND tbl_name = ?1 AND name NOT LIKE 'sqlite_autoindex%'
             ORDER BY name",
        )
        .map_err(|e| LaError::Database(e.to_string()))?;

    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))
        .map_err(|e| LaError::Database(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LaError::Database(e.to_string()))?;
    Ok(names)
}

/// Column names of a table, in declaration order. Empty when the table
/// does not exist.
pub fn table_columns(conn: &Connection, table: &str) -> LaResult<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
        .map_err(|e| LaError::Database(e.to_string()))?;

    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))
        .map_err(|e| LaError::Database(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LaError::Database(e.to_string()))?;
    Ok(names)
}

/// A column that older databases at the same path may lack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddedColumn {
    pub table: &'static str,
    pub name: &'static str,
    /// Type and constraints for `ALTER TABLE ... ADD COLUMN`. Defaults must
    /// be constant.
    pub definition: &'static str,
}

/// Columns missing from tables created by the earlier bot.
pub const ADDED_COLUMNS: &[AddedColumn] = &[
    AddedColumn { table: "reminders", name: "chat_id", definition: "INTEGER" },
    AddedColumn { table: "reminders", name: "completed", definition: "BOOLEAN NOT NULL DEFAULT FALSE" },
    AddedColumn { table: "chat_logs", name: "username", definition: "TEXT" },
    AddedColumn { table: "chat_logs", name: "is_bot", definition: "BOOLEAN NOT NULL DEFAULT FALSE" },
    AddedColumn { table: "todos", name: "chat_id", definition: "INTEGER" },
    AddedColumn { table: "todos", name: "priority", definition: "INTEGER NOT NULL DEFAULT 1" },
    AddedColumn { table: "todos", name: "due_date", definition: "TIMESTAMP" },
    AddedColumn { table: "todos", name: "completed", definition: "BOOLEAN NOT NULL DEFAULT FALSE" },
    AddedColumn { table: "todos", name: "completed_at", definition: "TIMESTAMP" },
    AddedColumn { table: "finances", name: "description", definition: "TEXT" },
];

/// Add every column from [`ADDED_COLUMNS`] that its table lacks.
///
/// Returns the `table.column` names that were added.
pub fn add_missing_columns(conn: &Connection) -> LaResult<Vec<String>> {
    let mut added = Vec::new();
    for column in ADDED_COLUMNS {
        let existing = table_columns(conn, column.table)?;
        if existing.is_empty() || existing.iter().any(|c| c == column.name) {
            continue;
        }
        conn.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            column.table, column.name, column.definition
        ))
        .map_err(|e| {
            LaError::Database(format!("failed to add {}.{}: {e}", column.table, column.name))
        })?;
        added.push(format!("{}.{}", column.table, column.name));
    }
    if !added.is_empty() {
        info!("added columns: {}", added.join(", "));
    }
    Ok(added)
}

/// Complete SQL schema for all tables.
const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- Telegram users and their subscription
CREATE TABLE IF NOT EXISTS users (
    user_id             INTEGER PRIMARY KEY,
    username            TEXT,
    first_name          TEXT,
    last_name           TEXT,
    subscription_end    DATE,
    created_at          TIMESTAMP DEFAULT (datetime('now', 'localtime'))
);

-- Payment ledger
CREATE TABLE IF NOT EXISTS payments (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id             INTEGER,
    amount              REAL,
    payment_id          TEXT,
    status              TEXT,
    created_at          TIMESTAMP DEFAULT (datetime('now', 'localtime'))
);

-- Reminders
CREATE TABLE IF NOT EXISTS reminders (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id             INTEGER,
    chat_id             INTEGER,
    text                TEXT,
    due_date            TIMESTAMP,
    completed           BOOLEAN NOT NULL DEFAULT FALSE,
    created_at          TIMESTAMP DEFAULT (datetime('now', 'localtime'))
);

-- Todo list
CREATE TABLE IF NOT EXISTS todos (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id             INTEGER NOT NULL,
    chat_id             INTEGER,
    task_text           TEXT NOT NULL,
    priority            INTEGER NOT NULL DEFAULT 1,
    due_date            TIMESTAMP,
    completed           BOOLEAN NOT NULL DEFAULT FALSE,
    completed_at        TIMESTAMP,
    created_at          TIMESTAMP DEFAULT (datetime('now', 'localtime'))
);

-- Income and expense records
CREATE TABLE IF NOT EXISTS finances (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id             INTEGER,
    amount              REAL,
    category            TEXT,
    description         TEXT,
    type                TEXT CHECK(type IN ('income', 'expense')),
    created_at          TIMESTAMP DEFAULT (datetime('now', 'localtime'))
);

-- Chat message log
CREATE TABLE IF NOT EXISTS chat_logs (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id             INTEGER,
    chat_id             INTEGER,
    username            TEXT,
    message             TEXT,
    is_bot              BOOLEAN NOT NULL DEFAULT FALSE,
    created_at          TIMESTAMP DEFAULT (datetime('now', 'localtime'))
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn index_count(conn: &Connection) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_create_tables_twice() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_secondary_indexes_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let first = apply_secondary_indexes(&conn).unwrap();
        let count_after_first = index_count(&conn);
        let second = apply_secondary_indexes(&conn).unwrap();

        assert_eq!(first, second);
        assert_eq!(count_after_first, 4);
        assert_eq!(index_count(&conn), 4);
    }

    #[test]
    fn test_secondary_index_columns() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        apply_secondary_indexes(&conn).unwrap();

        let cols: Vec<String> = conn
            .prepare("SELECT name FROM pragma_index_info('idx_reminders_user_due') ORDER BY seqno")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(cols, vec!["user_id", "due_date"]);

        let unique: i64 = conn
            .query_row(
                "SELECT \"unique\" FROM pragma_index_list('payments') WHERE name = 'idx_payments_user_created'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(unique, 0);
    }

    #[test]
    fn test_secondary_indexes_missing_table_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let err = apply_secondary_indexes(&conn).unwrap_err();
        assert!(matches!(err, LaError::Database(_)));
    }

    #[test]
    fn test_script_text() {
        let script = secondary_index_script();
        assert_eq!(script.lines().count(), 4);
        assert!(script.contains(
            "CREATE INDEX IF NOT EXISTS idx_finances_user_created ON finances(user_id, created_at);"
        ));
    }

    #[test]
    fn test_add_missing_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE reminders (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id INTEGER,
                 text TEXT, due_date TIMESTAMP, completed BOOLEAN DEFAULT FALSE,
                 created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP);
             INSERT INTO reminders (user_id, text, due_date) VALUES (1, 'old', '2024-01-01 10:00:00');",
        )
        .unwrap();

        let added = add_missing_columns(&conn).unwrap();
        assert_eq!(added, vec!["reminders.chat_id"]);
        assert!(table_columns(&conn, "reminders").unwrap().contains(&"chat_id".to_string()));
        assert!(add_missing_columns(&conn).unwrap().is_empty());

        let chat: Option<i64> = conn
            .query_row("SELECT chat_id FROM reminders", [], |row| row.get(0))
            .unwrap();
        assert_eq!(chat, None);
    }

    #[test]
    fn test_finance_type_check() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let res = conn.execute(
            "INSERT INTO finances (user_id, amount, category, type) VALUES (1, 10.0, 'food', 'gift')",
            [],
        );
        assert!(res.is_err());
    }
}
