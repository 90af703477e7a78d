//! Chat message log, mood heuristic, history search and assistant triggers.

use serde::Serialize;
use tracing::debug;

use la_core::constants::{mood, ASSISTANT_TRIGGERS, DEFAULT_MOOD_WINDOW};
use la_core::error::LaResult;
use la_models::{ChatLog, Database};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{Service, ServiceState};

pub const MOOD_POSITIVE: &str = "😊 Положительный";
pub const MOOD_NEGATIVE: &str = "😔 Отрицательный";
pub const MOOD_NEUTRAL: &str = "😐 Нейтральный";

/// Keyword-count mood over a user's recent messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodReport {
    pub total_messages: usize,
    pub positive: usize,
    pub negative: usize,
    pub mood: String,
}

impl MoodReport {
    /// Count keyword hits. A keyword counts once per message it occurs in.
    pub fn from_messages<'a>(messages: impl IntoIterator<Item = &'a str>) -> Self {
        let mut total = 0;
        let mut positive = 0;
        let mut negative = 0;
        for msg in messages {
            total += 1;
            let lower = msg.to_lowercase();
            positive += mood::POSITIVE.iter().filter(|w| lower.contains(*w)).count();
            negative += mood::NEGATIVE.iter().filter(|w| lower.contains(*w)).count();
        }

        let label = if positive > negative {
            MOOD_POSITIVE
        } else if negative > positive {
            MOOD_NEGATIVE
        } else {
            MOOD_NEUTRAL
        };

        Self {
            total_messages: total,
            positive,
            negative,
            mood: label.to_string(),
        }
    }
}

/// Whether a message addresses the assistant: a trigger word anywhere in
/// the lowercased text, or an exact `@<bot_username>` mention.
pub fn should_respond(text: &str, bot_username: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    if ASSISTANT_TRIGGERS.iter().any(|t| lower.contains(t)) {
        return true;
    }
    !bot_username.is_empty() && text.contains(&format!("@{bot_username}"))
}

/// Strip trigger words and the bot mention, leaving the question itself.
pub fn extract_query(text: &str, bot_username: &str) -> String {
    let mut clean = text.to_string();
    for trigger in ASSISTANT_TRIGGERS {
        clean = clean.replace(trigger, "").replace(&trigger.to_uppercase(), "");
    }
    if !bot_username.is_empty() {
        clean = clean.replace(&format!("@{bot_username}"), "");
    }
    clean.trim().to_string()
}

/// Render recent chat history as prompt context. Empty history gives an
/// empty string.
pub fn format_context(history: &[ChatLog], current: &str) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut lines = vec!["Контекст предыдущего разговора в чате:".to_string()];
    for msg in history {
        let role = if msg.is_bot { "Ассистент" } else { "Пользователь" };
        let name = msg.username.clone().unwrap_or_else(|| format!("user{}", msg.user_id));
        lines.push(format!("{role} {name}: {}", msg.message));
    }
    lines.push(format!("\nТекущий запрос пользователя: {current}"));
    lines.join("\n")
}

/// Stores chat traffic and answers questions about it.
#[derive(Clone)]
pub struct ChatMonitorService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl ChatMonitorService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    /// Append a message to the chat log.
    pub fn log_message(
        &self,
        chat_id: i64,
        user_id: i64,
        username: Option<&str>,
        message: &str,
        is_bot: bool,
    ) -> LaResult<ChatLog> {
        let mut log = ChatLog::new(user_id, chat_id, username.map(String::from), message);
        log.is_bot = is_bot;
        let conn = self.database.conn()?;
        let id = log.insert(&conn)?;

        debug!("logged message {id} in chat {chat_id}");
        self.event_bus.emit(AppEvent::ChatMessageLogged {
            chat_id,
            user_id,
            is_bot,
        });
        Ok(log)
    }

    /// Mood over the user's last `limit` messages (default window when `None`).
    pub fn analyze_mood(&self, user_id: i64, limit: Option<usize>) -> LaResult<MoodReport> {
        let limit = limit.unwrap_or(DEFAULT_MOOD_WINDOW as usize);
        let conn = self.database.conn()?;
        let messages = ChatLog::recent_for_user(&conn, user_id, limit)?;
        Ok(MoodReport::from_messages(messages.iter().map(|m| m.message.as_str())))
    }

    /// Case-insensitive search of a chat's user messages, newest first.
    pub fn search(&self, chat_id: i64, query: &str, limit: usize) -> LaResult<Vec<ChatLog>> {
        let conn = self.database.conn()?;
        ChatLog::search(&conn, chat_id, query, limit)
    }

    /// The last `limit` messages of a chat, oldest first.
    pub fn history(&self, chat_id: i64, limit: usize) -> LaResult<Vec<ChatLog>> {
        let conn = self.database.conn()?;
        ChatLog::recent_for_chat(&conn, chat_id, limit)
    }

    /// Prompt context built from the chat's last `limit` messages.
    pub fn conversation_context(&self, chat_id: i64, current: &str, limit: usize) -> LaResult<String> {
        let history = self.history(chat_id, limit)?;
        Ok(format_context(&history, current))
    }
}

impl Service for ChatMonitorService {
    fn name(&self) -> &str {
        "chat_monitor"
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
