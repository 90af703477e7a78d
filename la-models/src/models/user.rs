//! Telegram user entity model.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use la_core::error::{LaError, LaResult};

use super::{opt_date_column, opt_ts_column};
use crate::time;

/// A Telegram user known to the bot, keyed by their Telegram user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Last day of the paid period. `None` means never subscribed.
    pub subscription_end: Option<NaiveDate>,
    pub created_at: Option<NaiveDateTime>,
}

impl User {
    /// A user with only the id set.
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            username: None,
            first_name: None,
            last_name: None,
            subscription_end: None,
            created_at: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_names(mut self, first: Option<String>, last: Option<String>) -> Self {
        self.first_name = first;
        self.last_name = last;
        self
    }

    /// Construct a User from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            username: row.get("username")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            subscription_end: opt_date_column(row, "subscription_end")?,
            created_at: opt_ts_column(row, "created_at")?,
        })
    }

    /// Insert the user unless a row with the same id already exists.
    ///
    /// Returns `true` when a new row was written. Existing rows, including
    /// their subscription date, are left untouched.
    pub fn upsert_ignore(&self, conn: &Connection) -> LaResult<bool> {
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO users (user_id, username, first_name, last_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    self.user_id,
                    self.username,
                    self.first_name,
                    self.last_name,
                    time::format_ts(&self.created_at.unwrap_or_else(time::now)),
                ],
            )
            .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(changed > 0)
    }

    /// Find a user by Telegram id.
    pub fn find(conn: &Connection, user_id: i64) -> LaResult<Option<Self>> {
        match conn.query_row("SELECT * FROM users WHERE user_id = ?1", [user_id], Self::from_row) {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LaError::Database(e.to_string())),
        }
    }

    /// Overwrite the subscription end date. Returns `false` if the user is unknown.
    pub fn set_subscription_end(conn: &Connection, user_id: i64, end: NaiveDate) -> LaResult<bool> {
        let changed = conn
            .execute(
                "UPDATE users SET subscription_end = ?1 WHERE user_id = ?2",
                params![time::format_date(&end), user_id],
            )
            .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(changed > 0)
    }

    /// All users, oldest registration first.
    pub fn list(conn: &Connection) -> LaResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT * FROM users ORDER BY created_at ASC, user_id ASC")
            .map_err(|e| LaError::Database(e.to_string()))?;

        let users = stmt
            .query_map([], Self::from_row)
            .map_err(|e| LaError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(users)
    }

    /// Best human-readable name: `@username`, then the full name, then the id.
    pub fn display_name(&self) -> String {
        if let Some(ref name) = self.username {
            if !name.is_empty() {
                return format!("@{name}");
            }
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.user_id.to_string()
        } else {
            full
        }
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

    #[test]
    fn test_upsert_ignore_keeps_first_row() {
        let conn = conn();
        assert!(User::new(10).with_username("alice").upsert_ignore(&conn).unwrap());
        assert!(!User::new(10).with_username("bob").upsert_ignore(&conn).unwrap());

        let user = User::find(&conn, 10).unwrap().unwrap();
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert!(user.subscription_end.is_none());
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_find_missing_user() {
        let conn = conn();
        assert!(User::find(&conn, 404).unwrap().is_none());
    }

    #[test]
    fn test_set_subscription_end() {
        let conn = conn();
        User::new(1).upsert_ignore(&conn).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        assert!(User::set_subscription_end(&conn, 1, end).unwrap());
        assert!(!User::set_subscription_end(&conn, 2, end).unwrap());
        assert_eq!(User::find(&conn, 1).unwrap().unwrap().subscription_end, Some(end));
    }

    #[test]
    fn test_list_users() {
        let conn = conn();
        User::new(2).upsert_ignore(&conn).unwrap();
        User::new(1).upsert_ignore(&conn).unwrap();
        assert_eq!(User::list(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(User::new(5).with_username("neo").display_name(), "@neo");
        let named = User::new(5).with_names(Some("Thomas".into()), Some("Anderson".into()));
        assert_eq!(named.display_name(), "Thomas Anderson");
        assert_eq!(User::new(5).display_name(), "5");
    }
}
