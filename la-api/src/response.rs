//! Wire types for the Telegram Bot API and YandexGPT responses.

use serde::{Deserialize, Serialize};
use la_core::error::{LaError, LaResult};

/// Telegram Bot API response envelope.
///
/// ```json
/// { "ok": true, "result": { ... } }
/// { "ok": false, "error_code": 400, "description": "Bad Request: chat not found" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramResponse<T = serde_json::Value> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

impl<T> TelegramResponse<T> {
    /// Unwrap the envelope into its result, mapping `ok=false` onto `LaError`.
    pub fn into_result(self) -> LaResult<T> {
        if !self.ok {
            let message = self
                .description
                .unwrap_or_else(|| "telegram request failed".to_string());
            return Err(match self.error_code {
                Some(401) | Some(403) => LaError::AuthFailed(message),
                Some(code) => LaError::ServerError {
                    status: u16::try_from(code).unwrap_or(0),
                    message,
                },
                None => LaError::Http(message),
            });
        }
        self.result
            .ok_or_else(|| LaError::Parse("telegram response has no result".into()))
    }
}

/// Subset of the Telegram `User` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

/// Subset of the Telegram `Chat` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TgChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

/// Subset of the Telegram `Message` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub date: i64,
    pub chat: TgChat,
    pub text: Option<String>,
}

/// YandexGPT completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub result: CompletionResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    #[serde(default)]
    pub alternatives: Vec<CompletionAlternative>,
    #[serde(rename = "modelVersion", default)]
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionAlternative {
    pub message: CompletionMessage,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub text: String,
}

impl CompletionResponse {
    /// Text of the first alternative.
    pub fn first_text(&self) -> Option<&str> {
        self.result
            .alternatives
            .first()
            .map(|a| a.message.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let json = serde_json::json!({
            "ok": true,
            "result": { "id": 1, "is_bot": true, "first_name": "Helper", "username": "helper_bot" }
        });
        let resp: TelegramResponse<TgUser> = serde_json::from_value(json).unwrap();
        let me = resp.into_result().unwrap();
        assert_eq!(me.username.as_deref(), Some("helper_bot"));
    }

    #[test]
    fn test_error_envelope() {
        let json = serde_json::json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        });
        let resp: TelegramResponse<TgMessage> = serde_json::from_value(json).unwrap();
        match resp.into_result().unwrap_err() {
            LaError::ServerError { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("chat not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unauthorized_envelope() {
        let json = serde_json::json!({ "ok": false, "error_code": 401, "description": "Unauthorized" });
        let resp: TelegramResponse = serde_json::from_value(json).unwrap();
        assert!(matches!(resp.into_result(), Err(LaError::AuthFailed(_))));
    }

    #[test]
    fn test_completion_first_text() {
        let json = serde_json::json!({
            "result": {
                "alternatives": [
                    { "message": { "role": "assistant", "text": "Привет!" }, "status": "ALTERNATIVE_STATUS_FINAL" }
                ],
                "modelVersion": "23.10.2024"
            }
        });
        let resp: CompletionResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.first_text(), Some("Привет!"));
    }

    #[test]
    fn test_completion_without_alternatives() {
        let json = serde_json::json!({ "result": { "alternatives": [] } });
        let resp: CompletionResponse = serde_json::from_value(json).unwrap();
        assert!(resp.first_text().is_none());
    }
}
