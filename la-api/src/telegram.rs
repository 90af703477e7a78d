//! Send-only Telegram Bot API client.
//!
//! The token is part of the request path (`/bot<token>/<method>`), so it is
//! kept out of every log line; requests are logged by method name only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use la_core::config::BotConfig;
use la_core::error::{LaError, LaResult};

use crate::client::HttpClient;
use crate::response::{TelegramResponse, TgMessage, TgUser};

/// Telegram caps a single text message at this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Anything that can deliver a text message to a chat.
///
/// Implemented by [`TelegramClient`]; the scheduler and assistant depend on
/// this trait so they can run against a recorder in tests.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> LaResult<()>;
}

/// Client for the subset of the Bot API the assistant uses.
#[derive(Clone)]
pub struct TelegramClient {
    http: HttpClient,
    base_url: String,
    token: String,
}

impl TelegramClient {
    /// Create a client from bot configuration. Fails when no token is set.
    pub fn new(config: &BotConfig) -> LaResult<Self> {
        if config.telegram_token.trim().is_empty() {
            return Err(LaError::MissingConfig("TELEGRAM_TOKEN".into()));
        }
        let http = HttpClient::new(Duration::from_millis(config.api_timeout_ms))?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.telegram_token.trim().to_string(),
        })
    }

    /// Replace the underlying HTTP client (retry policy, timeout).
    pub fn with_http(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: Option<&serde_json::Value>,
    ) -> LaResult<T> {
        let http_method = if body.is_some() { Method::POST } else { Method::GET };
        let url = self.method_url(method);
        let resp = self
            .http
            .request_with_retry(http_method, &url, method, &[], body)
            .await?;
        let envelope: TelegramResponse<T> = HttpClient::parse_json(resp).await?;
        envelope.into_result()
    }

    /// Identify the bot behind the token.
    pub async fn get_me(&self) -> LaResult<TgUser> {
        let me: TgUser = self.call("getMe", None).await?;
        info!(
            "connected to Telegram as @{}",
            me.username.as_deref().unwrap_or("unknown")
        );
        Ok(me)
    }

    /// Send a plain text message. Long texts are split into several messages.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> LaResult<Vec<TgMessage>> {
        let mut sent = Vec::new();
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let body = json!({ "chat_id": chat_id, "text": chunk });
            let msg: TgMessage = self.call("sendMessage", Some(&body)).await?;
            sent.push(msg);
        }
        debug!("sent {} message(s) to chat {}", sent.len(), chat_id);
        Ok(sent)
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> LaResult<()> {
        self.send_message(chat_id, text).await.map(|_| ())
    }
}

/// Split text into chunks of at most `max_chars` characters, preferring
/// line breaks as cut points. Empty input yields one empty chunk.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len <= max_chars {
            current.push_str(line);
            current_len += line_len;
            continue;
        }
        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        // A single line longer than the limit is cut on char boundaries.
        let mut rest: Vec<char> = line.chars().collect();
        while rest.len() > max_chars {
            let tail = rest.split_off(max_chars);
            chunks.push(rest.into_iter().collect());
            rest = tail;
        }
        current_len = rest.len();
        current = rest.into_iter().collect();
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
