//! Profile and completion clients against a loopback HTTP stub

use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use diarist_core::{
    Error,
    config::{LlmConfig, ProfileConfig},
    llm::{LlmClient, Message, TextCompletion},
    profile::{HttpProfileClient, ProfileSource},
};

/// Serve one canned response and hand back the raw request
async fn serve_once(status: u16, body: String, delay: Duration) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        tokio::time::sleep(delay).await;

        let response = format!(
            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        request
    });

    (base_url, handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

fn profile_config(base_url: &str, timeout_secs: u64) -> ProfileConfig {
    ProfileConfig {
        base_url: base_url.to_string(),
        timeout_secs,
    }
}

fn llm_config(base_url: &str) -> LlmConfig {
    LlmConfig {
        base_url: format!("{}/v1", base_url),
        timeout_secs: 5,
        ..LlmConfig::default()
    }
}

#[tokio::test]
async fn test_profile_fetch_success() {
    let body = json!({
        "full_name": "Sam",
        "social_interactions": {"family": {"son": {"name": "Alex"}}}
    })
    .to_string();
    let (base_url, server) = serve_once(200, body, Duration::ZERO).await;

    let client = HttpProfileClient::new(&profile_config(&base_url, 5)).unwrap();
    let profile = client.fetch(42).await.unwrap();

    assert_eq!(profile.full_name, "Sam");
    assert_eq!(profile.family().next().map(|(key, _)| key), Some("son"));

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /profiles/42 HTTP/1.1"));
}

#[tokio::test]
async fn test_profile_fetch_not_found() {
    let (base_url, _server) = serve_once(404, "{\"detail\":\"nope\"}".to_string(), Duration::ZERO).await;

    let client = HttpProfileClient::new(&profile_config(&base_url, 5)).unwrap();
    let err = client.fetch(7).await.unwrap_err();

    match err {
        Error::UpstreamUnavailable {
            service, status, ..
        } => {
            assert_eq!(service, "profile service");
            assert_eq!(status, Some(404));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_profile_fetch_timeout() {
    let (base_url, _server) = serve_once(200, "{}".to_string(), Duration::from_secs(3)).await;

    let client = HttpProfileClient::new(&profile_config(&base_url, 1)).unwrap();
    let err = client.fetch(7).await.unwrap_err();

    assert!(matches!(
        err,
        Error::UpstreamTimeout {
            service: "profile service",
            timeout_secs: 1
        }
    ));
}

#[tokio::test]
async fn test_profile_fetch_invalid_document() {
    let (base_url, _server) = serve_once(200, "<html>oops</html>".to_string(), Duration::ZERO).await;

    let client = HttpProfileClient::new(&profile_config(&base_url, 5)).unwrap();
    let err = client.fetch(7).await.unwrap_err();

    match err {
        Error::Internal(message) => assert!(message.starts_with("Invalid profile document")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_profile_service_unreachable() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = HttpProfileClient::new(&profile_config(&base_url, 2)).unwrap();
    let err = client.fetch(1).await.unwrap_err();
    assert_eq!(err.code(), "E100");
}

#[tokio::test]
async fn test_chat_completion_request_and_response() {
    let body = json!({
        "id": "chatcmpl-9",
        "object": "chat.completion",
        "model": "amethyst-13b-mistral",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "{\"refined_text\": \"t\"}"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
    })
    .to_string();
    let (base_url, server) = serve_once(200, body, Duration::ZERO).await;

    let client = LlmClient::builder()
        .config(llm_config(&base_url))
        .api_key("local-key")
        .build()
        .unwrap();
    let response = client
        .complete(vec![Message::system("sys"), Message::user("hello")])
        .await
        .unwrap();

    assert_eq!(response.content, "{\"refined_text\": \"t\"}");
    assert_eq!(response.tokens_used, 25);
    assert_eq!(response.raw["id"], "chatcmpl-9");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions HTTP/1.1"));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer local-key"));

    let body_start = request.find("\r\n\r\n").unwrap() + 4;
    let sent: serde_json::Value = serde_json::from_str(&request[body_start..]).unwrap();
    assert_eq!(sent["model"], "amethyst-13b-mistral");
    assert_eq!(sent["temperature"], 0.5);
    assert_eq!(sent["max_tokens"], 4096);
    assert_eq!(sent["messages"][1]["content"], "hello");
}

#[tokio::test]
async fn test_chat_completion_server_error() {
    let (base_url, _server) =
        serve_once(503, "{\"error\":\"model not loaded\"}".to_string(), Duration::ZERO).await;

    let client = LlmClient::new(llm_config(&base_url)).unwrap();
    let err = client.complete(vec![Message::user("hi")]).await.unwrap_err();

    assert!(matches!(
        err,
        Error::UpstreamUnavailable {
            service: "completion service",
            status: Some(503),
            ..
        }
    ));
}

#[tokio::test]
async fn test_chat_completion_without_choices() {
    let (base_url, _server) = serve_once(200, "{\"choices\": []}".to_string(), Duration::ZERO).await;

    let client = LlmClient::new(llm_config(&base_url)).unwrap();
    let err = client.complete(vec![Message::user("hi")]).await.unwrap_err();
    assert!(matches!(err, Error::MalformedModelOutput(_)));
}

#[tokio::test]
async fn test_chat_completion_timeout() {
    let (base_url, _server) = serve_once(200, "{}".to_string(), Duration::from_secs(3)).await;

    let client = LlmClient::builder()
        .config(llm_config(&base_url))
        .timeout_secs(1)
        .build()
        .unwrap();
    let err = client.complete(vec![Message::user("hi")]).await.unwrap_err();

    assert_eq!(err.code(), "E101");
}

#[tokio::test]
async fn test_health_checks() {
    let (profile_url, profile_server) = serve_once(404, "{}".to_string(), Duration::ZERO).await;
    let profiles = HttpProfileClient::new(&profile_config(&profile_url, 2)).unwrap();
    profiles.health_check().await.unwrap();
    assert!(profile_server.await.unwrap().starts_with("GET / HTTP/1.1"));

    let (llm_url, llm_server) = serve_once(200, "{\"data\": []}".to_string(), Duration::ZERO).await;
    let llm = LlmClient::new(llm_config(&llm_url)).unwrap();
    llm.health_check().await.unwrap();
    assert!(llm_server.await.unwrap().starts_with("GET /v1/models HTTP/1.1"));

    let (down_url, _server) = serve_once(500, "{}".to_string(), Duration::ZERO).await;
    let llm = LlmClient::new(llm_config(&down_url)).unwrap();
    assert_eq!(llm.health_check().await.unwrap_err().code(), "E100");
}
