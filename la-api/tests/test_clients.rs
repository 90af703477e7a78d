//! Client tests against a one-shot local HTTP responder.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use la_api::{HttpClient, RetryConfig, TelegramClient, YandexGptClient};
use la_core::config::{AssistantConfig, BotConfig};
use la_core::error::LaError;

/// Serve exactly one request with a canned JSON answer.
/// The handle resolves to the raw request text.
async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.expect("read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if request_complete(&buf) {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&buf).to_string()
    });

    (format!("http://{addr}"), handle)
}

fn request_complete(buf: &[u8]) -> bool {
    let text = String::from_utf8_lossy(buf);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .find_map(|l| {
            let (k, v) = l.split_once(':')?;
            k.eq_ignore_ascii_case("content-length")
                .then(|| v.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    buf.len() >= header_end + 4 + content_length
}

fn no_retry() -> HttpClient {
    HttpClient::new(Duration::from_secs(5))
        .unwrap()
        .with_retry_config(RetryConfig::none())
}

#[tokio::test]
async fn test_send_message_posts_chat_and_text() {
    let body = serde_json::json!({
        "ok": true,
        "result": { "message_id": 7, "date": 0, "chat": { "id": 42, "type": "private" }, "text": "hi" }
    })
    .to_string();
    let (base, server) = serve_once("200 OK", body).await;

    let config = BotConfig {
        telegram_token: "123:abc".into(),
        api_base_url: base,
        ..BotConfig::default()
    };
    let client = TelegramClient::new(&config).unwrap().with_http(no_retry());

    let sent = client.send_message(42, "hi").await.unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat.id, 42);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /bot123:abc/sendMessage"));
    assert!(request.contains("\"chat_id\":42"));
}

#[tokio::test]
async fn test_telegram_error_envelope_maps_to_server_error() {
    let body = serde_json::json!({
        "ok": false,
        "error_code": 400,
        "description": "Bad Request: chat not found"
    })
    .to_string();
    let (base, server) = serve_once("400 Bad Request", body).await;

    let config = BotConfig {
        telegram_token: "123:abc".into(),
        api_base_url: base,
        ..BotConfig::default()
    };
    let client = TelegramClient::new(&config).unwrap().with_http(no_retry());

    let err = client.send_message(1, "x").await.unwrap_err();
    match err {
        LaError::ServerError { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Bad Request: chat not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_completion_client_error_carries_server_message() {
    let body = serde_json::json!({
        "error": { "grpcCode": 3, "httpCode": 400, "message": "Invalid model uri", "httpStatus": "Bad Request" }
    })
    .to_string();
    let (base, server) = serve_once("400 Bad Request", body).await;

    let config = AssistantConfig {
        api_key: "secret".into(),
        folder_id: "folder".into(),
        endpoint: base,
        ..AssistantConfig::default()
    };
    let client = YandexGptClient::new(&config).unwrap().with_http(no_retry());

    match client.complete("s", "q").await.unwrap_err() {
        LaError::ServerError { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid model uri");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_completion_sends_api_key_and_returns_text() {
    let body = serde_json::json!({
        "result": { "alternatives": [ { "message": { "role": "assistant", "text": " Ответ " } } ] }
    })
    .to_string();
    let (base, server) = serve_once("200 OK", body).await;

    let config = AssistantConfig {
        api_key: "secret".into(),
        folder_id: "folder".into(),
        endpoint: format!("{base}/foundationModels/v1/completion"),
        ..AssistantConfig::default()
    };
    let client = YandexGptClient::new(&config).unwrap().with_http(no_retry());

    let answer = client.complete("system", "question").await.unwrap();
    assert_eq!(answer, "Ответ");

    let request = server.await.unwrap();
    assert!(request.to_lowercase().contains("authorization: api-key secret"));
    assert!(request.contains("gpt://folder/yandexgpt/latest"));
}

#[tokio::test]
async fn test_completion_without_answer_is_parse_error() {
    let body = serde_json::json!({ "result": { "alternatives": [] } }).to_string();
    let (base, server) = serve_once("200 OK", body).await;

    let config = AssistantConfig {
        api_key: "secret".into(),
        folder_id: "folder".into(),
        endpoint: base,
        ..AssistantConfig::default()
    };
    let client = YandexGptClient::new(&config).unwrap().with_http(no_retry());

    assert!(matches!(
        client.complete("s", "q").await,
        Err(LaError::Parse(_))
    ));
    server.await.unwrap();
}
