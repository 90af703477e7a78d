//! Versioned database migrations.
//!
//! Migrations run sequentially from the current stored version to the latest.
//! Each migration is an idempotent SQL script.

use rusqlite::Connection;
use tracing::{info, warn};
use la_core::error::{LaError, LaResult};
use la_core::constants::DB_SCHEMA_VERSION;

use crate::schema;

/// Run all pending migrations on the database.
pub fn run_migrations(conn: &Connection) -> LaResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version >= DB_SCHEMA_VERSION {
        info!("database schema is up to date (version {current_version})");
        return Ok(());
    }

    info!("running migrations from version {current_version} to {DB_SCHEMA_VERSION}");

    for version in (current_version + 1)..=DB_SCHEMA_VERSION {
        run_migration(conn, version)?;
    }

    set_schema_version(conn, DB_SCHEMA_VERSION)?;
    info!("migrations complete, schema at version {DB_SCHEMA_VERSION}");
    Ok(())
}

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> LaResult<i32> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .map_err(|e| LaError::Database(e.to_string()))?;

    if count == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])
            .map_err(|e| LaError::Database(e.to_string()))?;
        return Ok(0);
    }

    conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get(0)
    })
    .map_err(|e| LaError::Database(e.to_string()))
}

fn set_schema_version(conn: &Connection, version: i32) -> LaResult<()> {
    conn.execute("UPDATE schema_version SET version = ?1", [version])
        .map_err(|e| LaError::Database(e.to_string()))?;
    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> LaResult<()> {
    info!("applying migration version {version}");

    match version {
        1 => migration_v1(conn),
        2 => migration_v2(conn),
        3 => migration_v3(conn),
        _ => {
            warn!("unknown migration version {version}, skipping");
            Ok(())
        }
    }
}

/// Migration v1: per-user lookup indexes on the four history tables.
fn migration_v1(conn: &Connection) -> LaResult<()> {
    schema::apply_secondary_indexes(conn)
        .map_err(|e| LaError::Migration(format!("v1: {e}")))?;
    Ok(())
}

/// Migration v2: due-date lookups for todos and the scheduler's pending scan.
fn migration_v2(conn: &Connection) -> LaResult<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_todos_user_due ON todos(user_id, due_date);
         CREATE INDEX IF NOT EXISTS idx_reminders_completed_due ON reminders(completed, due_date);",
    )
    .map_err(|e| LaError::Migration(format!("v2: {e}")))?;
    Ok(())
}

/// Migration v3: columns absent from databases left by the earlier bot,
/// which shares the default database path.
fn migration_v3(conn: &Connection) -> LaResult<()> {
    schema::add_missing_columns(conn).map_err(|e| LaError::Migration(format!("v3: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, DB_SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
    }

    #[test]
    fn test_migrations_create_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let reminders = schema::list_indexes(&conn, "reminders").unwrap();
        assert_eq!(
            reminders,
            vec!["idx_reminders_completed_due", "idx_reminders_user_due"]
        );
        let todos = schema::list_indexes(&conn, "todos").unwrap();
        assert_eq!(todos, vec!["idx_todos_user_due"]);
    }
}
