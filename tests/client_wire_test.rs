//! Wire-level client lifecycle tests against a mock HTTP server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xai_sdk::transport::ConnectionState;
use xai_sdk::{Client, ErrorKind};

mod support;

#[tokio::test]
async fn conversation_id_header_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/validate"))
        .and(header("x-conversation-id", "conv-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "redacted_api_key": "xai-****1234",
            "user_id": "user-1",
            "name": "ci key"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = support::client_for(&server)
        .with_conversation_id("conv-42")
        .expect("tagged client");
    let key = client.auth().validate_key().await.expect("key ok");

    assert_eq!(key.redacted_api_key, "xai-****1234");
    assert!(key.is_usable());
}

#[tokio::test]
async fn internal_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/language-models"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "backend hiccup"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/language-models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "grok-3", "max_prompt_length": 131072}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = support::config_for(&server)
        .with_max_retries(2)
        .with_retry_backoff(Duration::from_millis(1))
        .with_max_backoff(Duration::from_millis(5));
    let client = Client::from_config(config).expect("valid test configuration");

    let models = client
        .models()
        .list_language_models()
        .await
        .expect("retried to success");
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "grok-3");
}

#[tokio::test]
async fn validation_failures_consume_no_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "unknown model"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = support::config_for(&server)
        .with_max_retries(3)
        .with_retry_backoff(Duration::from_millis(1));
    let client = Client::from_config(config).expect("valid test configuration");

    let request = xai_sdk::chat::ChatRequest::new("grok-3")
        .with_message(xai_sdk::chat::Message::user("hi"));
    let err = client.chat().sample(&request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(server.received_requests().await.expect("recorded").len(), 1);
}

#[tokio::test]
async fn health_reaches_ready_after_a_successful_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "redacted_api_key": "xai-****1234"
        })))
        .mount(&server)
        .await;

    let client = support::client_for(&server);
    assert_eq!(client.health().await.state, ConnectionState::Idle);

    client.auth().validate_key().await.expect("key ok");
    assert_eq!(client.health().await.state, ConnectionState::Ready);
}

#[tokio::test]
async fn closed_client_sends_nothing() {
    let server = MockServer::start().await;

    let client = support::client_for(&server);
    client.close().await.expect("close ok");

    let err = client.auth().validate_key().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Canceled);
    assert_eq!(client.health().await.state, ConnectionState::Shutdown);
    assert!(server.received_requests().await.expect("recorded").is_empty());
}
