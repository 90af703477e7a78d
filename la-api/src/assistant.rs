//! YandexGPT completion client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use la_core::config::AssistantConfig;
use la_core::error::{LaError, LaResult};

use crate::client::HttpClient;
use crate::response::CompletionResponse;

/// Anything that turns a system prompt plus a user prompt into an answer.
///
/// Implemented by [`YandexGptClient`]; the assistant service depends on this
/// trait so it can run against canned answers in tests.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> LaResult<String>;
}

/// Client for the foundation-models completion endpoint.
#[derive(Clone)]
pub struct YandexGptClient {
    http: HttpClient,
    endpoint: String,
    api_key: String,
    folder_id: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl YandexGptClient {
    /// Create a client. Both the API key and the folder id are required.
    pub fn new(config: &AssistantConfig) -> LaResult<Self> {
        let mut missing = Vec::new();
        if config.api_key.trim().is_empty() {
            missing.push("YANDEX_API_KEY");
        }
        if config.folder_id.trim().is_empty() {
            missing.push("YANDEX_FOLDER_ID");
        }
        if !missing.is_empty() {
            return Err(LaError::MissingConfig(missing.join(", ")));
        }

        Ok(Self {
            http: HttpClient::new(Duration::from_millis(config.timeout_ms))?,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.trim().to_string(),
            folder_id: config.folder_id.trim().to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Replace the underlying HTTP client (retry policy, timeout).
    pub fn with_http(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }

    /// `gpt://<folder>/<model>`
    pub fn model_uri(&self) -> String {
        format!("gpt://{}/{}", self.folder_id, self.model)
    }

    /// Request body for a single system + user exchange.
    pub fn build_request(&self, system: &str, prompt: &str) -> Value {
        json!({
            "modelUri": self.model_uri(),
            "completionOptions": {
                "stream": false,
                "temperature": self.temperature,
                "maxTokens": self.max_tokens,
            },
            "messages": [
                { "role": "system", "text": system },
                { "role": "user", "text": prompt },
            ],
        })
    }

    /// Run a completion and return the first alternative's text.
    pub async fn complete(&self, system: &str, prompt: &str) -> LaResult<String> {
        let body = self.build_request(system, prompt);
        let headers = [("Authorization", format!("Api-Key {}", self.api_key))];

        debug!("completion request ({} prompt chars)", prompt.chars().count());
        let resp: CompletionResponse = self
            .http
            .post_json(&self.endpoint, "yandexgpt completion", &headers, &body)
            .await?;

        resp.first_text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LaError::Parse("completion response has no answer text".into()))
    }
}

#[async_trait]
impl CompletionClient for YandexGptClient {
    async fn complete(&self, system: &str, prompt: &str) -> LaResult<String> {
        YandexGptClient::complete(self, system, prompt).await
    }
}
