//! Shared HTTP client with retry and error classification.
//!
//! Both remote APIs go through [`HttpClient::request_with_retry`], which
//! retries transient failures (timeouts, refused connections, gateway
//! errors) with exponential backoff and maps everything else onto `LaError`.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use la_core::error::{LaError, LaResult};

/// Retry configuration for HTTP requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// HTTP status codes that trigger a retry.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(4),
            retryable_statuses: vec![429, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Thin wrapper over `reqwest::Client` adding retry and error mapping.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
    retry_config: RetryConfig,
}

impl HttpClient {
    /// Build a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> LaResult<Self> {
        let inner = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(15))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| LaError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            timeout,
            retry_config: RetryConfig::default(),
        })
    }

    /// Set custom retry configuration.
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> RequestBuilder {
        let mut builder = self.inner.request(method, url).timeout(self.timeout);
        for (key, value) in headers {
            builder = builder.header(*key, value.as_str());
        }
        if let Some(b) = body {
            builder = builder.json(b);
        }
        builder
    }

    /// Execute a request with exponential backoff retry.
    ///
    /// `label` is what gets logged in place of the URL, so secrets embedded
    /// in the path never reach the log.
    pub async fn request_with_retry(
        &self,
        method: Method,
        url: &str,
        label: &str,
        headers: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> LaResult<Response> {
        debug!("{} {}", method, label);

        let mut last_error: Option<LaError> = None;

        for attempt in 0..=self.retry_config.max_retries {
            if attempt > 0 {
                let delay = self.calculate_retry_delay(attempt - 1);
                warn!(
                    "retrying {} {} (attempt {}/{}) after {:.1}s",
                    method,
                    label,
                    attempt + 1,
                    self.retry_config.max_retries + 1,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }

            let builder = self.build_request(method.clone(), url, headers, body);

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();

                    if self
                        .retry_config
                        .retryable_statuses
                        .contains(&status.as_u16())
                        && attempt < self.retry_config.max_retries
                    {
                        warn!("retryable status {} from {}", status.as_u16(), label);
                        last_error = Some(LaError::ServerError {
                            status: status.as_u16(),
                            message: format!("retryable status {status}"),
                        });
                        continue;
                    }

                    return Self::check_status(response).await;
                }
                Err(e) => {
                    let is_retryable = e.is_timeout() || e.is_connect();
                    let err = Self::classify_error(e);

                    if is_retryable && attempt < self.retry_config.max_retries {
                        warn!("retryable error on {}: {}", label, err);
                        last_error = Some(err);
                        continue;
                    }

                    return Err(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LaError::Http("max retries exceeded".into())))
    }

    /// POST a JSON body and deserialize the JSON answer.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        label: &str,
        headers: &[(&str, String)],
        body: &serde_json::Value,
    ) -> LaResult<T> {
        let resp = self
            .request_with_retry(Method::POST, url, label, headers, Some(body))
            .await?;
        Self::parse_json(resp).await
    }

    /// GET and deserialize the JSON answer.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, label: &str) -> LaResult<T> {
        let resp = self
            .request_with_retry(Method::GET, url, label, &[], None)
            .await?;
        Self::parse_json(resp).await
    }

    /// Deserialize a response body.
    pub async fn parse_json<T: DeserializeOwned>(response: Response) -> LaResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| LaError::Serialization(format!("failed to parse response: {e}")))
    }

    /// Calculate retry delay with exponential backoff.
    fn calculate_retry_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.retry_config.base_delay.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(1u64 << attempt.min(32));
        let max_ms = self.retry_config.max_delay.as_millis() as u64;
        Duration::from_millis(delay_ms.min(max_ms))
    }

    /// Check the HTTP status code and convert to LaError if needed.
    ///
    /// Any non-2xx status becomes an error carrying the server's own
    /// description of the problem.
    async fn check_status(response: Response) -> LaResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| format!("server returned {status}"));

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LaError::AuthFailed(message));
        }
        Err(LaError::ServerError {
            status: status.as_u16(),
            message,
        })
    }

    /// Classify a reqwest error into a LaError variant.
    fn classify_error(e: reqwest::Error) -> LaError {
        // reqwest includes the URL in its messages; strip it.
        let e = e.without_url();
        if e.is_timeout() {
            LaError::Timeout(e.to_string())
        } else if e.is_connect() {
            LaError::Http(format!("connection failed: {e}"))
        } else {
            LaError::Http(e.to_string())
        }
    }
}

/// Pull a readable message out of an error body.
///
/// Telegram puts it in `description`, YandexGPT in `error.message` or
/// `message`. Non-JSON bodies are returned as they are.
pub fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Some(body.to_string());
    };
    ["/description", "/error/message", "/message"]
        .iter()
        .find_map(|ptr| value.pointer(ptr).and_then(|v| v.as_str()))
        .map(String::from)
        .or_else(|| Some(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#).as_deref(),
            Some("Bad Request: chat not found")
        );
        assert_eq!(
            error_message(r#"{"error":{"grpcCode":3,"httpCode":400,"message":"invalid model uri"}}"#).as_deref(),
            Some("invalid model uri")
        );
        assert_eq!(error_message("upstream timed out").as_deref(), Some("upstream timed out"));
        assert_eq!(error_message("  "), None);
    }

    fn client() -> HttpClient {
        HttpClient::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_retry_delay_calculation() {
        let client = client();
        assert_eq!(client.calculate_retry_delay(0), Duration::from_secs(1));
        assert_eq!(client.calculate_retry_delay(1), Duration::from_secs(2));
        assert_eq!(client.calculate_retry_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_delay_capped() {
        let client = client();
        assert!(client.calculate_retry_delay(10) <= Duration::from_secs(4));
        assert!(client.calculate_retry_delay(40) <= Duration::from_secs(4));
    }

    #[test]
    fn test_retry_none() {
        let client = client().with_retry_config(RetryConfig::none());
        assert_eq!(client.retry_config.max_retries, 0);
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let client = client().with_retry_config(RetryConfig::none());
        let err = client
            .request_with_retry(Method::GET, "http://127.0.0.1:9/", "discard port", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, LaError::Http(_) | LaError::Timeout(_)));
    }
}
