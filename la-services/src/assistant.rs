//! Question answering with chat context.

use std::sync::Arc;

use tracing::{info, warn};

use la_api::CompletionClient;
use la_core::error::{LaError, LaResult};

use crate::chat_monitor::ChatMonitorService;
use crate::event_bus::{AppEvent, EventBus};

/// Base instructions for the model. Chat context is appended below it.
pub const SYSTEM_PROMPT: &str = "Ты помощник в групповом чате и видишь историю сообщений.

Правила:
1. Отвечай только на вопросы, обращённые к тебе.
2. Опирайся на предыдущие сообщения, если они относятся к вопросу.
3. Пиши кратко и дружелюбно.
4. Отвечай на русском языке.";

/// Assistant answers are stored in the chat log under this name when the
/// bot's own username is unknown.
const DEFAULT_BOT_NAME: &str = "assistant";

/// Compose the system prompt with optional chat context.
pub fn system_prompt(context: &str) -> String {
    if context.is_empty() {
        SYSTEM_PROMPT.to_string()
    } else {
        format!("{SYSTEM_PROMPT}\n\n{context}")
    }
}

/// Answers questions using the completion backend and the chat history.
pub struct AssistantService {
    completer: Arc<dyn CompletionClient>,
    chat: ChatMonitorService,
    event_bus: EventBus,
    context_messages: usize,
    bot_name: String,
}

impl AssistantService {
    pub fn new(
        completer: Arc<dyn CompletionClient>,
        chat: ChatMonitorService,
        event_bus: EventBus,
        context_messages: usize,
    ) -> Self {
        Self {
            completer,
            chat,
            event_bus,
            context_messages,
            bot_name: DEFAULT_BOT_NAME.to_string(),
        }
    }

    /// Name recorded on the assistant's own chat log rows.
    pub fn with_bot_name(mut self, name: impl Into<String>) -> Self {
        self.bot_name = name.into();
        self
    }

    /// Answer `question` asked by `user_id` in `chat_id`.
    ///
    /// The context is read before the answer is logged, so the reply never
    /// sees itself. The answer is stored in the chat log as a bot message.
    pub async fn ask(
        &self,
        chat_id: i64,
        user_id: i64,
        username: Option<&str>,
        question: &str,
    ) -> LaResult<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(LaError::Validation("question is empty".into()));
        }

        let context = self
            .chat
            .conversation_context(chat_id, question, self.context_messages)
            .unwrap_or_else(|e| {
                warn!("could not load context for chat {chat_id}: {e}");
                String::new()
            });

        info!(
            "asking assistant for user {} in chat {chat_id} (context {} chars)",
            username.unwrap_or("?"),
            context.chars().count()
        );
        let answer = self.completer.complete(&system_prompt(&context), question).await?;

        self.chat
            .log_message(chat_id, user_id, Some(&self.bot_name), &answer, true)?;
        self.event_bus.emit(AppEvent::AssistantAnswered { chat_id, user_id });
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use la_models::Database;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Canned {
        prompts: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl CompletionClient for Canned {
        async fn complete(&self, system: &str, prompt: &str) -> LaResult<String> {
            self.prompts.lock().unwrap().push((system.to_string(), prompt.to_string()));
            Ok("Ответ".to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl CompletionClient for Failing {
        async fn complete(&self, _: &str, _: &str) -> LaResult<String> {
            Err(LaError::Timeout("yandexgpt completion".into()))
        }
    }

    fn chat() -> (ChatMonitorService, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("t.db"), &Default::default()).unwrap();
        (ChatMonitorService::new(db, EventBus::new(64)), dir)
    }

    #[test]
    fn test_system_prompt() {
        assert_eq!(system_prompt(""), SYSTEM_PROMPT);
        assert!(system_prompt("ctx").ends_with("\n\nctx"));
    }

    #[tokio::test]
    async fn test_ask_logs_answer() {
        let (chat, _dir) = chat();
        chat.log_message(9, 1, Some("anna"), "бот, что такое Rust?", false).unwrap();

        let canned = Arc::new(Canned::default());
        let svc = AssistantService::new(canned.clone(), chat.clone(), EventBus::new(16), 15)
            .with_bot_name("helper_bot");

        let answer = svc.ask(9, 1, Some("anna"), "что такое Rust?").await.unwrap();
        assert_eq!(answer, "Ответ");

        let prompts = canned.prompts.lock().unwrap().clone();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("Пользователь anna: бот, что такое Rust?"));
        assert!(!prompts[0].0.contains("Ответ"));
        assert_eq!(prompts[0].1, "что такое Rust?");

        let history = chat.history(9, 10).unwrap();
        let last = history.last().unwrap();
        assert!(last.is_bot);
        assert_eq!(last.username.as_deref(), Some("helper_bot"));
        assert_eq!(last.message, "Ответ");
    }

    #[tokio::test]
    async fn test_failed_completion_logs_nothing() {
        let (chat, _dir) = chat();
        let svc = AssistantService::new(Arc::new(Failing), chat.clone(), EventBus::new(16), 15);

        assert!(matches!(svc.ask(9, 1, None, "вопрос").await, Err(LaError::Timeout(_))));
        assert!(chat.history(9, 10).unwrap().is_empty());
        assert!(matches!(svc.ask(9, 1, None, "  ").await, Err(LaError::Validation(_))));
    }
}
