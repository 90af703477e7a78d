//! CLI command implementations.

pub mod init;
pub mod run;
pub mod config;
pub mod db;
pub mod users;
pub mod reminders;
pub mod todos;
pub mod finance;
pub mod chat;
pub mod payments;
pub mod ask;

use std::path::PathBuf;

use chrono::NaiveDateTime;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use la_core::config::ConfigHandle;
use la_core::constants::DISPLAY_FORMAT;
use la_core::error::LaResult;
use la_models::Database;

/// Resolve the database file from the configured URL.
pub async fn database_path(config: &ConfigHandle) -> LaResult<PathBuf> {
    config.read().await.effective_db_path()
}

/// Helper to open (and if needed create) the database from config.
pub async fn init_database(config: &ConfigHandle) -> LaResult<Database> {
    let db_path = database_path(config).await?;
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db_config = config.read().await.database.clone();
    Database::init(&db_path, &db_config)
}

/// A table with the shared look.
pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Pretty-print any serializable value as JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Timestamp as shown to users.
pub fn display_ts(ts: &NaiveDateTime) -> String {
    ts.format(DISPLAY_FORMAT).to_string()
}

/// Truncate a string to a maximum number of characters, appending an
/// ellipsis if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars > 3 {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("привет", 10), "привет");
        assert_eq!(truncate("напоминание", 6), "нап...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_display_ts() {
        let ts = la_models::time::parse_ts("2024-12-25 18:30:00").unwrap();
        assert_eq!(display_ts(&ts), "25.12.2024 18:30");
    }
}
