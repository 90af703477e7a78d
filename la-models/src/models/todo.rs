//! Todo list entity model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use la_core::error::{LaError, LaResult};

use super::opt_ts_column;
use crate::time;

/// Known priority levels.
pub mod priority {
    pub const NORMAL: i64 = 1;
    pub const HIGH: i64 = 2;
    pub const URGENT: i64 = 3;
}

/// A task on a user's todo list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: Option<i64>,
    pub user_id: i64,
    pub chat_id: Option<i64>,
    pub task_text: String,
    pub priority: i64,
    pub due_date: Option<NaiveDateTime>,
    pub completed: bool,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
}

impl Todo {
    pub fn new(user_id: i64, chat_id: Option<i64>, task_text: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id,
            chat_id,
            task_text: task_text.into(),
            priority: priority::NORMAL,
            due_date: None,
            completed: false,
            completed_at: None,
            created_at: None,
        }
    }

    /// Construct a Todo from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            user_id: row.get("user_id")?,
            chat_id: row.get("chat_id")?,
            task_text: row.get("task_text")?,
            priority: row.get("priority")?,
            due_date: opt_ts_column(row, "due_date")?,
            completed: row.get("completed")?,
            completed_at: opt_ts_column(row, "completed_at")?,
            created_at: opt_ts_column(row, "created_at")?,
        })
    }

    /// Priority marker shown in listings.
    pub fn priority_marker(&self) -> &'static str {
        match self.priority {
            p if p >= priority::URGENT => "🔴",
            priority::HIGH => "🟡",
            _ => "🟢",
        }
    }

    /// Insert this todo and record its new id.
    pub fn insert(&mut self, conn: &Connection) -> LaResult<i64> {
        let created = self.created_at.unwrap_or_else(time::now);
        conn.execute(
            "INSERT INTO todos (user_id, chat_id, task_text, priority, due_date, completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.user_id,
                self.chat_id,
                self.task_text,
                self.priority,
                self.due_date.as_ref().map(time::format_ts),
                self.completed,
                time::format_ts(&created),
            ],
        )
        .map_err(|e| LaError::Database(e.to_string()))?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        self.created_at = Some(created);
        Ok(id)
    }

    /// Find a todo by id.
    pub fn find(conn: &Connection, id: i64) -> LaResult<Option<Self>> {
        match conn.query_row("SELECT * FROM todos WHERE id = ?1", [id], Self::from_row) {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LaError::Database(e.to_string())),
        }
    }

    /// A user's open (or finished) todos, highest priority first, then by due date.
    pub fn list_for_user(conn: &Connection, user_id: i64, completed: bool) -> LaResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT * FROM todos WHERE user_id = ?1 AND completed = ?2
                 ORDER BY priority DESC, due_date IS NULL, due_date ASC, id ASC",
            )
            .map_err(|e| LaError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![user_id, completed], Self::from_row)
            .map_err(|e| LaError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(rows)
    }

    /// Mark a todo done, stamping `completed_at`. Already finished todos don't match.
    pub fn complete(conn: &Connection, id: i64, user_id: i64, at: &NaiveDateTime) -> LaResult<bool> {
        let changed = conn
            .execute(
                "UPDATE todos SET completed = TRUE, completed_at = ?1
                 WHERE id = ?2 AND user_id = ?3 AND completed = FALSE",
                params![time::format_ts(at), id, user_id],
            )
            .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(changed > 0)
    }

    /// Delete a todo owned by `user_id`.
    pub fn delete(conn: &Connection, id: i64, user_id: i64) -> LaResult<bool> {
        let changed = conn
            .execute("DELETE FROM todos WHERE id = ?1 AND user_id = ?2", params![id, user_id])
            .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(changed > 0)
    }
}
