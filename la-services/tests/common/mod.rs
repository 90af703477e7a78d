//! Shared test utilities for integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use la_core::config::{AppConfig, ConfigHandle, DatabaseConfig};
use la_models::{time, ChatLog, Database, FinanceEntry, Reminder, Todo, TransactionType, User};
use la_services::event_bus::EventBus;
use tempfile::TempDir;

/// Create a temporary database with full schema and migrations applied.
/// Returns the Database and the TempDir (must be held alive for the duration of the test).
pub fn create_test_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("test.db");
    let config = DatabaseConfig::default();
    let db = Database::init(&path, &config).expect("failed to init test database");
    (db, dir)
}

/// Create a ConfigHandle wrapping a default config.
pub fn create_test_config_handle() -> ConfigHandle {
    ConfigHandle::new(AppConfig::default())
}

/// Create an EventBus with a small buffer suitable for tests.
pub fn create_test_event_bus() -> EventBus {
    EventBus::new(64)
}

pub fn ts(s: &str) -> NaiveDateTime {
    time::parse_ts(s).expect("bad test timestamp")
}

pub fn day(s: &str) -> NaiveDate {
    time::parse_date(s).expect("bad test date")
}

/// Seed the database with realistic test data.
///
/// Creates:
/// - 3 users (one subscribed until 2025-02-01)
/// - 4 reminders for user 1 (one completed, two overdue as of 2025-01-10 12:00)
/// - 3 todos for user 1 with mixed priorities
/// - 4 finance entries for user 1
/// - 6 chat messages in chat -100 (one from the assistant)
pub fn seed_test_data(db: &Database) {
    let conn = db.conn().expect("failed to get connection for seeding");

    for id in 1..=3 {
        User::new(id)
            .with_username(format!("user{id}"))
            .upsert_ignore(&conn)
            .expect("failed to insert user");
    }
    User::set_subscription_end(&conn, 1, day("2025-02-01")).expect("failed to set subscription");

    let reminders = [
        ("утренняя зарядка", "2025-01-10 07:00:00", true),
        ("позвонить маме", "2025-01-10 09:00:00", false),
        ("оплатить интернет", "2025-01-10 11:30:00", false),
        ("встреча с командой", "2025-01-11 10:00:00", false),
    ];
    for (text, due, done) in reminders {
        let mut r = Reminder::new(1, Some(-100), text, ts(due));
        let id = r.insert(&conn).expect("failed to insert reminder");
        if done {
            Reminder::mark_completed(&conn, id, None).expect("failed to complete reminder");
        }
    }

    for (text, prio) in [("купить хлеб", 1), ("сдать отчёт", 3), ("записаться к врачу", 2)] {
        let mut t = Todo::new(1, None, text);
        t.priority = prio;
        t.insert(&conn).expect("failed to insert todo");
    }

    let entries = [
        (50_000.0, "зарплата", TransactionType::Income),
        (1_200.0, "еда", TransactionType::Expense),
        (800.0, "еда", TransactionType::Expense),
        (3_000.0, "транспорт", TransactionType::Expense),
    ];
    for (amount, category, kind) in entries {
        FinanceEntry::new(1, amount, category, None, kind)
            .insert(&conn)
            .expect("failed to insert finance entry");
    }

    let messages = [
        (1, "user1", "Всем привет!", false),
        (2, "user2", "Привет, как дела?", false),
        (1, "user1", "Отлично, спасибо", false),
        (2, "user2", "бот, какая завтра погода?", false),
        (2, "helper_bot", "Завтра солнечно", true),
        (3, "user3", "Мне сегодня грустно", false),
    ];
    for (user, name, text, is_bot) in messages {
        let mut log = ChatLog::new(user, -100, Some(name.to_string()), text);
        log.is_bot = is_bot;
        log.insert(&conn).expect("failed to insert chat log");
    }
}
