//! Income/expense ledger and period reports.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use la_core::error::{LaError, LaResult};
use la_models::{Database, FinanceEntry, TransactionType};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{Service, ServiceState};

/// Time window covered by a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    #[default]
    All,
    /// Since midnight today.
    Day,
    /// The last 7 days.
    Week,
    /// The last 30 days.
    Month,
}

impl ReportPeriod {
    /// Lower bound for entries in this period, or `None` for all time.
    pub fn since(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::All => None,
            Self::Day => now.date().and_hms_opt(0, 0, 0),
            Self::Week => now.checked_sub_signed(Duration::days(7)),
            Self::Month => now.checked_sub_signed(Duration::days(30)),
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::All => "all",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ReportPeriod {
    type Err = LaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "всё" | "все" => Ok(Self::All),
            "day" | "день" => Ok(Self::Day),
            "week" | "неделя" => Ok(Self::Week),
            "month" | "месяц" => Ok(Self::Month),
            other => Err(LaError::Validation(format!(
                "unknown period '{other}', expected all, day, week or month"
            ))),
        }
    }
}

/// Totals for one user over one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialReport {
    pub period: ReportPeriod,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    /// `"<type>_<category>"` to total, e.g. `expense_food`.
    pub categories: BTreeMap<String, f64>,
}

/// Records transactions and builds reports.
pub struct FinanceService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl FinanceService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    pub fn add_transaction(
        &self,
        user_id: i64,
        amount: f64,
        category: &str,
        description: Option<&str>,
        kind: TransactionType,
    ) -> LaResult<FinanceEntry> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LaError::Validation(format!("amount must be positive, got {amount}")));
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(LaError::Validation("category is empty".into()));
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);

        let mut entry = FinanceEntry::new(user_id, amount, category, description, kind);
        let conn = self.database.conn()?;
        let id = entry.insert(&conn)?;

        info!("recorded {kind} {amount:.2} in '{category}' for user {user_id}");
        self.event_bus.emit(AppEvent::TransactionRecorded {
            entry_id: id,
            user_id,
            amount,
            is_income: kind == TransactionType::Income,
        });
        Ok(entry)
    }

    pub fn report(&self, user_id: i64, period: ReportPeriod, now: NaiveDateTime) -> LaResult<FinancialReport> {
        let since = period.since(now);
        let conn = self.database.conn()?;
        let totals = FinanceEntry::totals_by_category(&conn, user_id, since.as_ref())?;

        let mut report = FinancialReport {
            period,
            ..FinancialReport::default()
        };
        for t in totals {
            match t.kind {
                TransactionType::Income => report.income += t.total,
                TransactionType::Expense => report.expense += t.total,
            }
            report.categories.insert(format!("{}_{}", t.kind, t.category), t.total);
        }
        report.balance = report.income - report.expense;
        Ok(report)
    }

    /// Latest entries, newest first.
    pub fn recent(&self, user_id: i64, limit: usize) -> LaResult<Vec<FinanceEntry>> {
        let conn = self.database.conn()?;
        FinanceEntry::recent_for_user(&conn, user_id, limit)
    }
}

impl Service for FinanceService {
    fn name(&self) -> &str {
        "finance"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> LaResult<()> {
        self.state = ServiceState::Running;
        Ok(())
    }

    fn shutdown(&mut self) -> LaResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
