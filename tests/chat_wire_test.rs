//! Wire-level chat tests against a mock HTTP server.
//!
//! These drive the production transport end to end: request shape, auth and
//! correlation headers, SSE decoding, error mapping, and the deferred flow.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};
use xai_sdk::ErrorKind;
use xai_sdk::chat::{ChatRequest, DeferredRequest, Message};

mod support;

fn chat_response() -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "model": "grok-3",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Rayleigh scattering."},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
    })
}

fn chunk_event(text: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "model": "grok-3",
        "choices": [{"index": 0, "delta": {"content": text}}]
    })
    .to_string()
}

#[tokio::test]
async fn completion_request_shape_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("x-environment", "production"))
        .and(header_exists("x-request-id"))
        .and(header_exists("x-client-version"))
        .and(|req: &Request| {
            let Ok(v) = serde_json::from_slice::<serde_json::Value>(&req.body) else {
                return false;
            };
            let messages = v["messages"].as_array().cloned().unwrap_or_default();
            v["model"] == "grok-3"
                && messages.len() == 2
                && messages[0]["role"] == "system"
                && messages[1]["role"] == "user"
                && v.get("stream").is_none()
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response()))
        .expect(1)
        .mount(&server)
        .await;

    let client = support::client_for(&server);
    let request = ChatRequest::new("grok-3")
        .with_message(Message::system("You are terse."))
        .with_message(Message::user("Why is the sky blue?"));
    let response = client.chat().sample(&request).await.expect("completion ok");

    assert_eq!(response.content(), "Rayleigh scattering.");
    assert_eq!(response.finish_reason(), Some("stop"));
    assert_eq!(response.usage().expect("usage").total_tokens, 16);
}

#[tokio::test]
async fn streaming_decodes_sse_chunks_in_order() {
    let server = MockServer::start().await;
    let body = format!(
        "data: {}\n\ndata: {}\n\ndata: [DONE]\n\n",
        chunk_event("Hel"),
        chunk_event("lo")
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("accept", "text/event-stream"))
        .and(|req: &Request| {
            serde_json::from_slice::<serde_json::Value>(&req.body)
                .is_ok_and(|v| v["stream"] == true)
        })
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = support::client_for(&server);
    let request = ChatRequest::new("grok-3").with_message(Message::user("hi"));
    let mut stream = client.chat().stream(&request).await.expect("stream starts");

    let mut content = String::new();
    while stream.next().await {
        if let Some(chunk) = stream.current() {
            content.push_str(chunk.content());
        }
    }
    assert_eq!(content, "Hello");
    assert!(stream.err().is_none());
}

#[tokio::test]
async fn stream_failure_is_surfaced_and_sticky() {
    let server = MockServer::start().await;
    let body = format!("data: {}\n\ndata: {{not json\n\n", chunk_event("partial"));
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = support::client_for(&server);
    let request = ChatRequest::new("grok-3").with_message(Message::user("hi"));
    let mut stream = client.chat().stream(&request).await.expect("stream starts");

    assert!(stream.next().await);
    assert_eq!(stream.current().expect("first chunk").content(), "partial");

    assert!(!stream.next().await);
    assert_eq!(stream.err().expect("terminal error").kind(), ErrorKind::Parsing);

    // The failure stays put across further calls.
    assert!(!stream.next().await);
    assert_eq!(stream.err().expect("terminal error").kind(), ErrorKind::Parsing);
    assert!(stream.current().is_none());
}

#[tokio::test]
async fn api_errors_map_to_kind_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "rate limit exceeded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = support::client_for(&server);
    let request = ChatRequest::new("grok-3").with_message(Message::user("hi"));
    let err = client.chat().sample(&request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimit);
    assert_eq!(err.status_code(), Some(429));
    assert!(err.to_string().contains("rate limit exceeded"));
    assert!(err.to_string().contains("sample completion"));
}

#[tokio::test]
async fn deferred_submit_then_poll_to_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/deferred-completion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"request_id": "defer-7"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/chat/deferred-completion/defer-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/chat/deferred-completion/defer-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "response": chat_response()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = support::client_for(&server);
    let request = DeferredRequest::new("grok-3").with_message(Message::user("hi"));
    let submission = client.chat().defer(&request).await.expect("submitted");
    assert_eq!(submission.request_id, "defer-7");

    let response = client
        .chat()
        .poll_deferred_with(
            &submission.request_id,
            Duration::from_millis(1),
            Duration::from_secs(5),
        )
        .await
        .expect("completed");
    assert_eq!(response.content(), "Rayleigh scattering.");
}
