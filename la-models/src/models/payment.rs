//! Payment ledger model. Rows are written as-is; no provider is contacted.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use la_core::error::{LaError, LaResult};

use super::opt_ts_column;
use crate::time;

/// Known payment status values.
pub mod status {
    pub const PENDING: &str = "pending";
    pub const SUCCEEDED: &str = "succeeded";
    pub const CANCELED: &str = "canceled";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Option<i64>,
    pub user_id: i64,
    pub amount: f64,
    /// Provider-side identifier.
    pub payment_id: String,
    pub status: String,
    pub created_at: Option<NaiveDateTime>,
}

impl Payment {
    pub fn new(user_id: i64, amount: f64, payment_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id,
            amount,
            payment_id: payment_id.into(),
            status: status.into(),
            created_at: None,
        }
    }

    /// Construct a Payment from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            user_id: row.get("user_id")?,
            amount: row.get::<_, Option<f64>>("amount")?.unwrap_or(0.0),
            payment_id: row.get::<_, Option<String>>("payment_id")?.unwrap_or_default(),
            status: row
                .get::<_, Option<String>>("status")?
                .unwrap_or_else(|| status::PENDING.to_string()),
            created_at: opt_ts_column(row, "created_at")?,
        })
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == status::SUCCEEDED
    }

    /// Insert this payment and record its new id.
    pub fn insert(&mut self, conn: &Connection) -> LaResult<i64> {
        let created = self.created_at.unwrap_or_else(time::now);
        conn.execute(
            "INSERT INTO payments (user_id, amount, payment_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.user_id,
                self.amount,
                self.payment_id,
                self.status,
                time::format_ts(&created),
            ],
        )
        .map_err(|e| LaError::Database(e.to_string()))?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        self.created_at = Some(created);
        Ok(id)
    }

    /// Find the most recent row carrying a provider payment id.
    pub fn find_by_payment_id(conn: &Connection, payment_id: &str) -> LaResult<Option<Self>> {
        match conn.query_row(
            "SELECT * FROM payments WHERE payment_id = ?1 ORDER BY id DESC LIMIT 1",
            [payment_id],
            Self::from_row,
        ) {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LaError::Database(e.to_string())),
        }
    }

    /// A user's payments, newest first.
    pub fn list_for_user(conn: &Connection, user_id: i64) -> LaResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT * FROM payments WHERE user_id = ?1 ORDER BY created_at DESC, id DESC")
            .map_err(|e| LaError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([user_id], Self::from_row)
            .map_err(|e| LaError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(rows)
    }

    /// Set the status of every row with this provider id. Returns rows touched.
    pub fn update_status(conn: &Connection, payment_id: &str, status: &str) -> LaResult<usize> {
        conn.execute(
            "UPDATE payments SET status = ?1 WHERE payment_id = ?2",
            params![status, payment_id],
        )
        .map_err(|e| LaError::Database(e.to_string()))
    }
}
