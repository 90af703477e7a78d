//! Life Assistant Models - Database schema, models, and migrations.
//!
//! This crate owns all data persistence: SQLite database initialization,
//! the relational schema for users, reminders, todos, finances, chat logs
//! and payments, the secondary index script, and versioned migrations.

pub mod db;
pub mod schema;
pub mod models;
pub mod migrations;
pub mod time;

// Re-export key types
pub use db::{Database, DatabaseStats, DbPool};
pub use models::user::User;
pub use models::reminder::Reminder;
pub use models::todo::Todo;
pub use models::finance::{FinanceEntry, TransactionType, CategoryTotal};
pub use models::chat_log::ChatLog;
pub use models::payment::Payment;
