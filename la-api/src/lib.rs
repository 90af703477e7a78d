//! Life Assistant API - outbound HTTP clients.
//!
//! Two remote services are used: the Telegram Bot API (send-only, for
//! reminder delivery and replies) and the YandexGPT completion endpoint.
//! Both share one retrying HTTP client with exponential backoff.

pub mod client;
pub mod response;
pub mod telegram;
pub mod assistant;

// Re-export key types
pub use client::{HttpClient, RetryConfig};
pub use response::{TelegramResponse, TgUser, TgMessage, CompletionResponse};
pub use telegram::{MessageSender, TelegramClient};
pub use assistant::{CompletionClient, YandexGptClient};
