//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "LifeAssistant";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database schema version.
pub const DB_SCHEMA_VERSION: i32 = 3;

/// Storage format for timestamps (local time, no zone).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used when showing a timestamp to a user.
pub const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Default number of chat log messages inspected for mood analysis.
pub const DEFAULT_MOOD_WINDOW: u32 = 100;

/// Default number of results for chat history search.
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;

/// Keyword lists for the mood heuristic.
pub mod mood {
    pub const POSITIVE: &[&str] = &[
        "отлично",
        "хорошо",
        "прекрасно",
        "супер",
        "спасибо",
        "рад",
        "доволен",
    ];

    pub const NEGATIVE: &[&str] = &[
        "плохо",
        "грустно",
        "ужасно",
        "злой",
        "разочарован",
        "обидно",
    ];
}

/// Words that address the assistant inside a chat message.
pub const ASSISTANT_TRIGGERS: &[&str] = &["/bot", "бот", "@bot"];

/// Text prefixed to delivered reminders.
pub const REMINDER_HEADER: &str = "🔔 Напоминание";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_keywords() {
        assert_eq!(mood::POSITIVE.len(), 7);
        assert_eq!(mood::NEGATIVE.len(), 6);
        assert!(mood::NEGATIVE.contains(&"обидно"));
    }

    #[test]
    fn test_timestamp_format_roundtrip() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 12, 25)
            .and_then(|d| d.and_hms_opt(18, 30, 0))
            .unwrap();
        let s = ts.format(TIMESTAMP_FORMAT).to_string();
        assert_eq!(s, "2024-12-25 18:30:00");
    }
}
