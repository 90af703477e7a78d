//! Reminder entity model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use la_core::error::{LaError, LaResult};

use super::{opt_ts_column, ts_column};
use crate::time;

/// A one-shot reminder delivered by the scheduler once `due_date` passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Option<i64>,
    pub user_id: i64,
    /// Chat to deliver into. Falls back to the user's private chat.
    pub chat_id: Option<i64>,
    pub text: String,
    pub due_date: NaiveDateTime,
    pub completed: bool,
    pub created_at: Option<NaiveDateTime>,
}

impl Reminder {
    pub fn new(user_id: i64, chat_id: Option<i64>, text: impl Into<String>, due_date: NaiveDateTime) -> Self {
        Self {
            id: None,
            user_id,
            chat_id,
            text: text.into(),
            due_date,
            completed: false,
            created_at: None,
        }
    }

    /// Construct a Reminder from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            user_id: row.get("user_id")?,
            chat_id: row.get("chat_id")?,
            text: row.get::<_, Option<String>>("text")?.unwrap_or_default(),
            due_date: ts_column(row, "due_date")?,
            completed: row.get("completed")?,
            created_at: opt_ts_column(row, "created_at")?,
        })
    }

    /// Where the reminder should be delivered.
    pub fn target_chat(&self) -> i64 {
        self.chat_id.unwrap_or(self.user_id)
    }

    /// Insert this reminder and record its new id.
    pub fn insert(&mut self, conn: &Connection) -> LaResult<i64> {
        let created = self.created_at.unwrap_or_else(time::now);
        conn.execute(
            "INSERT INTO reminders (user_id, chat_id, text, due_date, completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.user_id,
                self.chat_id,
                self.text,
                time::format_ts(&self.due_date),
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

    /// Find a reminder by id.
    pub fn find(conn: &Connection, id: i64) -> LaResult<Option<Self>> {
        match conn.query_row("SELECT * FROM reminders WHERE id = ?1", [id], Self::from_row) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LaError::Database(e.to_string())),
        }
    }

    /// A user's reminders ordered by due date. Completed ones only when asked.
    pub fn list_for_user(conn: &Connection, user_id: i64, show_completed: bool) -> LaResult<Vec<Self>> {
        let sql = if show_completed {
            "SELECT * FROM reminders WHERE user_id = ?1 ORDER BY due_date ASC, id ASC"
        } else {
            "SELECT * FROM reminders WHERE user_id = ?1 AND completed = FALSE ORDER BY due_date ASC, id ASC"
        };
        Self::query_list(conn, sql, params![user_id])
    }

    /// Pending reminders whose due date is at or before `now`, oldest first.
    pub fn list_due(conn: &Connection, now: &NaiveDateTime) -> LaResult<Vec<Self>> {
        Self::query_list(
            conn,
            "SELECT * FROM reminders WHERE completed = FALSE AND due_date <= ?1
             ORDER BY due_date ASC, id ASC",
            params![time::format_ts(now)],
        )
    }

    /// Mark a reminder completed, optionally only if it belongs to `user_id`.
    ///
    /// Returns `false` when nothing matched.
    pub fn mark_completed(conn: &Connection, id: i64, user_id: Option<i64>) -> LaResult<bool> {
        let changed = match user_id {
            Some(uid) => conn.execute(
                "UPDATE reminders SET completed = TRUE WHERE id = ?1 AND user_id = ?2",
                params![id, uid],
            ),
            None => conn.execute("UPDATE reminders SET completed = TRUE WHERE id = ?1", [id]),
        }
        .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(changed > 0)
    }

    /// Delete a reminder owned by `user_id`.
    pub fn delete(conn: &Connection, id: i64, user_id: i64) -> LaResult<bool> {
        let changed = conn
            .execute(
                "DELETE FROM reminders WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )
            .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(changed > 0)
    }

    fn query_list(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> LaResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| LaError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(args, Self::from_row)
            .map_err(|e| LaError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        conn
    }

    fn at(s: &str) -> NaiveDateTime {
        time::parse_ts(s).unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let conn = conn();
        let mut r = Reminder::new(1, Some(-100), "call mom", at("2025-01-01 09:00:00"));
        let id = r.insert(&conn).unwrap();

        let found = Reminder::find(&conn, id).unwrap().unwrap();
        assert_eq!(found.text, "call mom");
        assert_eq!(found.target_chat(), -100);
        assert!(!found.completed);
    }

    #[test]
    fn test_target_chat_falls_back_to_user() {
        let r = Reminder::new(42, None, "x", at("2025-01-01 09:00:00"));
        assert_eq!(r.target_chat(), 42);
    }

    #[test]
    fn test_list_due_boundary() {
        let conn = conn();
        Reminder::new(1, None, "past", at("2025-01-01 08:00:00")).insert(&conn).unwrap();
        Reminder::new(1, None, "exact", at("2025-01-01 09:00:00")).insert(&conn).unwrap();
        Reminder::new(1, None, "future", at("2025-01-01 09:00:01")).insert(&conn).unwrap();

        let due = Reminder::list_due(&conn, &at("2025-01-01 09:00:00")).unwrap();
        let texts: Vec<_> = due.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["past", "exact"]);
    }

    #[test]
    fn test_completed_reminders_are_not_due() {
        let conn = conn();
        let mut r = Reminder::new(1, None, "done", at("2025-01-01 08:00:00"));
        let id = r.insert(&conn).unwrap();
        assert!(Reminder::mark_completed(&conn, id, None).unwrap());
        assert!(Reminder::list_due(&conn, &at("2025-01-02 00:00:00")).unwrap().is_empty());
    }

    #[test]
    fn test_list_for_user_hides_completed() {
        let conn = conn();
        let mut a = Reminder::new(1, None, "b", at("2025-01-02 08:00:00"));
        let a_id = a.insert(&conn).unwrap();
        Reminder::new(1, None, "a", at("2025-01-01 08:00:00")).insert(&conn).unwrap();
        Reminder::new(2, None, "other", at("2025-01-01 08:00:00")).insert(&conn).unwrap();
        Reminder::mark_completed(&conn, a_id, Some(1)).unwrap();

        assert_eq!(Reminder::list_for_user(&conn, 1, false).unwrap().len(), 1);
        let all = Reminder::list_for_user(&conn, 1, true).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].text, "a");
    }

    #[test]
    fn test_ownership_scoping() {
        let conn = conn();
        let mut r = Reminder::new(1, None, "mine", at("2025-01-01 08:00:00"));
        let id = r.insert(&conn).unwrap();

        assert!(!Reminder::mark_completed(&conn, id, Some(2)).unwrap());
        assert!(!Reminder::delete(&conn, id, 2).unwrap());
        assert!(Reminder::delete(&conn, id, 1).unwrap());
        assert!(Reminder::find(&conn, id).unwrap().is_none());
    }
}
