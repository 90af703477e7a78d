//! Chat message log model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use la_core::error::{LaError, LaResult};

use super::ts_column;
use crate::time;

/// One logged chat message, either from a person or from the bot itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLog {
    pub id: Option<i64>,
    pub user_id: i64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub message: String,
    pub is_bot: bool,
    pub created_at: NaiveDateTime,
}

impl ChatLog {
    pub fn new(user_id: i64, chat_id: i64, username: Option<String>, message: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id,
            chat_id,
            username,
            message: message.into(),
            is_bot: false,
            created_at: time::now(),
        }
    }

    /// Construct a ChatLog from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            user_id: row.get("user_id")?,
            chat_id: row.get("chat_id")?,
            username: row.get("username")?,
            message: row.get::<_, Option<String>>("message")?.unwrap_or_default(),
            is_bot: row.get("is_bot")?,
            created_at: ts_column(row, "created_at")?,
        })
    }

    /// Label used when rendering a transcript line.
    pub fn speaker(&self) -> String {
        if self.is_bot {
            return "Ассистент".to_string();
        }
        match self.username.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("user{}", self.user_id),
        }
    }

    /// Insert this message and record its new id.
    pub fn insert(&mut self, conn: &Connection) -> LaResult<i64> {
        conn.execute(
            "INSERT INTO chat_logs (user_id, chat_id, username, message, is_bot, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.user_id,
                self.chat_id,
                self.username,
                self.message,
                self.is_bot,
                time::format_ts(&self.created_at),
            ],
        )
        .map_err(|e| LaError::Database(e.to_string()))?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// A user's latest messages across all chats, newest first. Bot replies excluded.
    pub fn recent_for_user(conn: &Connection, user_id: i64, limit: usize) -> LaResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT * FROM chat_logs WHERE user_id = ?1 AND is_bot = FALSE
                 ORDER BY created_at DESC, id DESC LIMIT ?2",
            )
            .map_err(|e| LaError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], Self::from_row)
            .map_err(|e| LaError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(rows)
    }

    /// The last `limit` messages of a chat, returned oldest first.
    pub fn recent_for_chat(conn: &Connection, chat_id: i64, limit: usize) -> LaResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT * FROM chat_logs WHERE chat_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2",
            )
            .map_err(|e| LaError::Database(e.to_string()))?;
        let mut rows = stmt
            .query_map(params![chat_id, limit as i64], Self::from_row)
            .map_err(|e| LaError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LaError::Database(e.to_string()))?;
        rows.reverse();
        Ok(rows)
    }

    /// Case-insensitive substring search within a chat, newest first.
    ///
    /// Matching happens in Rust so that non-ASCII text folds case correctly;
    /// SQLite's `LIKE` only folds ASCII.
    pub fn search(conn: &Connection, chat_id: i64, query: &str, limit: usize) -> LaResult<Vec<Self>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = conn
            .prepare(
                "SELECT * FROM chat_logs WHERE chat_id = ?1 AND is_bot = FALSE
                 ORDER BY created_at DESC, id DESC",
            )
            .map_err(|e| LaError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([chat_id], Self::from_row)
            .map_err(|e| LaError::Database(e.to_string()))?;

        let mut found = Vec::new();
        for row in rows {
            let log = row.map_err(|e| LaError::Database(e.to_string()))?;
            if log.message.to_lowercase().contains(&needle) {
                found.push(log);
                if found.len() >= limit {
                    break;
                }
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        conn
    }

    fn seed(conn: &Connection, chat: i64, messages: &[&str]) {
        let base = time::parse_ts("2025-01-01 10:00:00").unwrap();
        for (i, text) in messages.iter().enumerate() {
            let mut log = ChatLog::new(1, chat, Some("alice".into()), *text);
            log.created_at = base + Duration::minutes(i as i64);
            log.insert(conn).unwrap();
        }
    }

    #[test]
    fn test_recent_for_chat_is_oldest_first() {
        let conn = conn();
        seed(&conn, 7, &["one", "two", "three"]);
        let texts: Vec<_> = ChatLog::recent_for_chat(&conn, 7, 2)
            .unwrap()
            .into_iter()
            .map(|l| l.message)
            .collect();
        assert_eq!(texts, vec!["two", "three"]);
    }

    #[test]
    fn test_search_folds_cyrillic_case() {
        let conn = conn();
        seed(&conn, 7, &["Встреча в Понедельник", "обед", "понедельник снова"]);
        seed(&conn, 8, &["понедельник в другом чате"]);

        let hits = ChatLog::search(&conn, 7, "ПОНЕДЕЛЬНИК", 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].message, "понедельник снова");

        assert_eq!(ChatLog::search(&conn, 7, "понедельник", 1).unwrap().len(), 1);
        assert!(ChatLog::search(&conn, 7, "   ", 5).unwrap().is_empty());
    }

    #[test]
    fn test_recent_for_user_skips_bot_replies() {
        let conn = conn();
        seed(&conn, 7, &["hi"]);
        let mut reply = ChatLog::new(1, 7, None, "hello back");
        reply.is_bot = true;
        reply.insert(&conn).unwrap();

        let mine = ChatLog::recent_for_user(&conn, 1, 10).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(reply.speaker(), "Ассистент");
        assert_eq!(mine[0].speaker(), "alice");
    }
}
