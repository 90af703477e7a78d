//! Income and expense ledger model.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use la_core::error::{LaError, LaResult};

use super::{conversion_error, ts_column};
use crate::time;

/// Direction of a money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Value stored in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "доход" | "+" => Ok(Self::Income),
            "expense" | "расход" | "-" => Ok(Self::Expense),
            other => Err(LaError::Validation(format!(
                "unknown transaction type '{other}' (expected income or expense)"
            ))),
        }
    }
}

/// One recorded transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceEntry {
    pub id: Option<i64>,
    pub user_id: i64,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub created_at: NaiveDateTime,
}

/// Sum of all transactions of one type in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub kind: TransactionType,
    pub category: String,
    pub total: f64,
}

impl FinanceEntry {
    pub fn new(
        user_id: i64,
        amount: f64,
        category: impl Into<String>,
        description: Option<String>,
        kind: TransactionType,
    ) -> Self {
        Self {
            id: None,
            user_id,
            amount,
            category: category.into(),
            description,
            kind,
            created_at: time::now(),
        }
    }

    /// Construct a FinanceEntry from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let raw_kind: String = row.get("type")?;
        let kind = raw_kind
            .parse::<TransactionType>()
            .map_err(|e| conversion_error(row, "type", e))?;
        Ok(Self {
            id: Some(row.get("id")?),
            user_id: row.get("user_id")?,
            amount: row.get("amount")?,
            category: row.get::<_, Option<String>>("category")?.unwrap_or_default(),
            description: row.get("description")?,
            kind,
            created_at: ts_column(row, "created_at")?,
        })
    }

    /// Insert this entry and record its new id.
    pub fn insert(&mut self, conn: &Connection) -> LaResult<i64> {
        conn.execute(
            "INSERT INTO finances (user_id, amount, category, description, type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.user_id,
                self.amount,
                self.category,
                self.description,
                self.kind.as_str(),
                time::format_ts(&self.created_at),
            ],
        )
        .map_err(|e| LaError::Database(e.to_string()))?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// A user's most recent entries, newest first.
    pub fn recent_for_user(conn: &Connection, user_id: i64, limit: usize) -> LaResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT * FROM finances WHERE user_id = ?1
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

    /// Per (type, category) totals for a user, optionally limited to entries
    /// created at or after `since`.
    pub fn totals_by_category(
        conn: &Connection,
        user_id: i64,
        since: Option<&NaiveDateTime>,
    ) -> LaResult<Vec<CategoryTotal>> {
        let since = since.map(time::format_ts);
        let mut stmt = conn
            .prepare(
                "SELECT type, category, SUM(amount) AS total FROM finances
                 WHERE user_id = ?1 AND (?2 IS NULL OR created_at >= ?2)
                 GROUP BY type, category
                 ORDER BY type, category",
            )
            .map_err(|e| LaError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id, since], |row| {
                let raw_kind: String = row.get("type")?;
                let kind = raw_kind
                    .parse::<TransactionType>()
                    .map_err(|e| conversion_error(row, "type", e))?;
                Ok(CategoryTotal {
                    kind,
                    category: row.get::<_, Option<String>>("category")?.unwrap_or_default(),
                    total: row.get::<_, Option<f64>>("total")?.unwrap_or(0.0),
                })
            })
            .map_err(|e| LaError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LaError::Database(e.to_string()))?;
        Ok(rows)
    }
}
