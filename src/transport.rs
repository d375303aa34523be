//! HTTP transport layer.
//!
//! [`HttpTransport`] is the seam between the service clients and the wire:
//! an injectable transport that can observe the final URL/headers/body and
//! return a synthetic response without going through `reqwest`, which is how
//! the tests script exact wire behavior. [`RestTransport`] is the production
//! implementation over a pooled `reqwest` client.
//!
//! The transport also owns the connection lifecycle. States follow the
//! standard channel model (`Idle → Connecting → Ready`, failures park in
//! `TransientFailure`, explicit close lands in `Shutdown`).
//! [`RestTransport::ensure_connection`] recreates the handle only from
//! `TransientFailure`; close is idempotent.

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::defaults;
use crate::error::{Error, ErrorKind, Result};
use crate::metadata::SdkMetadata;
use crate::retry::{RetryExecutor, RetryPolicy};

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No request has been made yet.
    Idle,
    /// A request is being established on a fresh handle.
    Connecting,
    /// The last request reached the service.
    Ready,
    /// The last request failed at the connection level.
    TransientFailure,
    /// The client was explicitly closed.
    Shutdown,
}

impl ConnectionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::TransientFailure => "transient_failure",
            Self::Shutdown => "shutdown",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Idle => "connection is idle",
            Self::Connecting => "connection is being established",
            Self::Ready => "connection is ready",
            Self::TransientFailure => "connection is in transient failure",
            Self::Shutdown => "connection is shut down",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time connection health snapshot.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub state: ConnectionState,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Transport-level request data.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    /// Path relative to the configured base URL, e.g. `/chat/completions`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Per-request timeout override; falls back to the configured default.
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
            timeout: None,
        }
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::PUT,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
            timeout: None,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Multipart upload request data.
///
/// Carried as plain values rather than a `reqwest` form so scripted
/// transports can inspect it.
#[derive(Debug, Clone)]
pub struct MultipartRequest {
    pub path: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub fields: Vec<(String, String)>,
}

/// Transport-level response data.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Decodes the body as JSON.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            Error::parsing(format!("failed to decode response body: {e}"))
                .with_context("body_len", self.body.len().to_string())
        })
    }
}

/// Server-sent event stream produced by a streaming call.
pub type SseStream =
    Pin<Box<dyn Stream<Item = Result<eventsource_stream::Event>> + Send + 'static>>;

/// Injectable wire transport.
///
/// The lifecycle methods default to no-ops so scripted test transports only
/// implement the calls they care about.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Executes a unary JSON request.
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse>;

    /// Executes a streaming request and returns the SSE event stream.
    async fn execute_stream(&self, request: TransportRequest) -> Result<SseStream>;

    /// Executes a multipart upload.
    async fn execute_multipart(&self, request: MultipartRequest) -> Result<TransportResponse>;

    /// Recreates the underlying handle when it is in transient failure.
    async fn ensure_connection(&self) -> Result<()> {
        Ok(())
    }

    /// Releases the underlying handle. Idempotent.
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Reports connection health.
    async fn health(&self) -> HealthStatus {
        HealthStatus {
            state: ConnectionState::Ready,
            timestamp: Utc::now(),
            message: ConnectionState::Ready.describe().to_string(),
        }
    }
}

struct StateInfo {
    state: ConnectionState,
    message: String,
}

/// Production transport over a pooled `reqwest` client.
pub struct RestTransport {
    client: RwLock<reqwest::Client>,
    state: RwLock<StateInfo>,
    config: Config,
    metadata: SdkMetadata,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl RestTransport {
    /// Builds the transport. Fails on invalid TLS/client configuration; no
    /// partial transport is ever returned.
    pub fn new(config: Config) -> Result<Self> {
        let client = build_client(&config)?;
        let metadata = SdkMetadata::from_config(&config);
        let base_url = config.base_url();
        let retry_policy = RetryPolicy::from_config(&config);
        Ok(Self {
            client: RwLock::new(client),
            state: RwLock::new(StateInfo {
                state: ConnectionState::Idle,
                message: ConnectionState::Idle.describe().to_string(),
            }),
            config,
            metadata,
            base_url,
            retry_policy,
        })
    }

    /// Tags all requests from this transport with a conversation id.
    pub fn with_conversation_id<S: Into<String>>(mut self, conversation_id: S) -> Self {
        self.metadata = self.metadata.with_conversation_id(conversation_id);
        self
    }

    fn request_headers(&self) -> Result<HeaderMap> {
        let mut headers = self.metadata.to_headers()?;
        let mut value = HeaderValue::from_str(&self.config.auth_header_value())
            .map_err(|e| Error::config(format!("API key is not a valid header value: {e}")))?;
        value.set_sensitive(true);
        if self.config.use_x_api_key {
            headers.insert(HeaderName::from_static(defaults::headers::X_API_KEY), value);
        } else {
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn check_open(&self) -> Result<()> {
        let info = self.state.read().await;
        if info.state == ConnectionState::Shutdown {
            return Err(Error::canceled("client is closed"));
        }
        Ok(())
    }

    async fn mark_connecting(&self) {
        let mut info = self.state.write().await;
        if info.state == ConnectionState::Idle {
            info.state = ConnectionState::Connecting;
            info.message = ConnectionState::Connecting.describe().to_string();
        }
    }

    async fn record_success(&self) {
        let mut info = self.state.write().await;
        if info.state != ConnectionState::Shutdown {
            info.state = ConnectionState::Ready;
            info.message = ConnectionState::Ready.describe().to_string();
        }
    }

    async fn record_failure(&self, error: &Error) {
        // A status-coded response means the connection itself worked.
        if error.status_code().is_some() {
            self.record_success().await;
            return;
        }
        if error.kind() == ErrorKind::Network {
            let mut info = self.state.write().await;
            if info.state != ConnectionState::Shutdown {
                info.state = ConnectionState::TransientFailure;
                info.message = error.to_string();
            }
        }
    }

    async fn send_once(&self, request: &TransportRequest) -> Result<TransportResponse> {
        let client = self.client.read().await.clone();
        let url = format!("{}{}", self.base_url, request.path);
        let timeout = request.timeout.unwrap_or(self.config.timeout);

        let mut builder = client
            .request(request.method.clone(), &url)
            .headers(self.request_headers()?)
            .timeout(timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = std::time::Instant::now();
        let response = builder.send().await.map_err(Error::from)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = read_capped(response).await?;
        if self.config.enable_telemetry {
            tracing::debug!(
                method = %request.method,
                path = %request.path,
                status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request completed"
            );
        }

        if status >= 400 {
            return Err(Error::from_status(status, extract_error_message(&body, status)));
        }
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpTransport for RestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.check_open().await?;
        self.mark_connecting().await;

        let executor = RetryExecutor::new(self.retry_policy.clone());
        let result = executor
            .execute(|| {
                let request = request.clone();
                async move { self.send_once(&request).await }
            })
            .await;

        match &result {
            Ok(_) => self.record_success().await,
            Err(error) => self.record_failure(error).await,
        }
        result
    }

    async fn execute_stream(&self, request: TransportRequest) -> Result<SseStream> {
        self.check_open().await?;
        self.mark_connecting().await;

        let client = self.client.read().await.clone();
        let url = format!("{}{}", self.base_url, request.path);
        let timeout = request.timeout.unwrap_or(self.config.stream_timeout);

        let mut builder = client
            .request(request.method.clone(), &url)
            .headers(self.request_headers()?)
            .header(ACCEPT, "text/event-stream")
            .timeout(timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let error = Error::from(e);
                self.record_failure(&error).await;
                return Err(error);
            }
        };

        let status = response.status().as_u16();
        if status >= 400 {
            let body = read_capped(response).await.unwrap_or_default();
            let error = Error::from_status(status, extract_error_message(&body, status));
            self.record_failure(&error).await;
            return Err(error);
        }
        self.record_success().await;

        let events = response
            .bytes_stream()
            .eventsource()
            .map(|item| item.map_err(|e| Error::stream(format!("event stream failed: {e}"))));
        Ok(Box::pin(events))
    }

    async fn execute_multipart(&self, request: MultipartRequest) -> Result<TransportResponse> {
        self.check_open().await?;
        self.mark_connecting().await;

        let part = reqwest::multipart::Part::bytes(request.data)
            .file_name(request.file_name.clone())
            .mime_str(&request.content_type)
            .map_err(|e| Error::validation(format!("invalid content type: {e}")))?;
        let mut form = reqwest::multipart::Form::new().part("file", part);
        for (key, value) in request.fields {
            form = form.text(key, value);
        }

        let client = self.client.read().await.clone();
        let url = format!("{}{}", self.base_url, request.path);

        let result: Result<TransportResponse> = async {
            let response = client
                .post(&url)
                .headers(self.request_headers()?)
                .multipart(form)
                .timeout(self.config.timeout)
                .send()
                .await
                .map_err(Error::from)?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = read_capped(response).await?;
            if status >= 400 {
                return Err(Error::from_status(status, extract_error_message(&body, status)));
            }
            Ok(TransportResponse {
                status,
                headers,
                body,
            })
        }
        .await;

        match &result {
            Ok(_) => self.record_success().await,
            Err(error) => self.record_failure(error).await,
        }
        result
    }

    async fn ensure_connection(&self) -> Result<()> {
        let current = self.state.read().await.state;
        match current {
            ConnectionState::Shutdown => Err(Error::canceled("client is closed")),
            ConnectionState::TransientFailure => {
                let fresh = build_client(&self.config)?;
                *self.client.write().await = fresh;
                let mut info = self.state.write().await;
                info.state = ConnectionState::Idle;
                info.message = "connection recreated".to_string();
                tracing::debug!("recreated HTTP handle after transient failure");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn close(&self) -> Result<()> {
        let mut info = self.state.write().await;
        info.state = ConnectionState::Shutdown;
        info.message = ConnectionState::Shutdown.describe().to_string();
        Ok(())
    }

    async fn health(&self) -> HealthStatus {
        let info = self.state.read().await;
        HealthStatus {
            state: info.state,
            timestamp: Utc::now(),
            message: info.message.clone(),
        }
    }
}

fn build_client(config: &Config) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.keepalive_timeout);
    if config.skip_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }
    builder
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
}

/// Reads a response body, enforcing the maximum buffered size.
async fn read_capped(response: reqwest::Response) -> Result<Vec<u8>> {
    let cap = defaults::limits::MAX_RESPONSE_SIZE;
    if let Some(len) = response.content_length()
        && len as usize > cap
    {
        return Err(Error::file(format!(
            "response body of {len} bytes exceeds the {cap} byte limit"
        )));
    }

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| Error::network(format!("failed to read response body: {e}")))?;
        if body.len() + chunk.len() > cap {
            return Err(Error::file(format!(
                "response body exceeds the {cap} byte limit"
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Pulls a human-readable message out of an error body.
///
/// The service returns either `{"error": "..."}`, `{"error": {"message":
/// "..."}}`, or `{"message": "..."}` depending on the endpoint; fall back to
/// the raw body, then to the bare status.
fn extract_error_message(body: &[u8], status: u16) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            return message.to_string();
        }
        if let Some(message) = value.pointer("/error/message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        format!("HTTP {status}")
    } else {
        text.to_string()
    }
}

/// Transport double driven by a queue of canned responses, shared by the
/// service client unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<TransportResponse>>>,
        requests: Mutex<Vec<TransportRequest>>,
        multiparts: Mutex<Vec<MultipartRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<Result<TransportResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
                multiparts: Mutex::new(Vec::new()),
            }
        }

        /// A 200 response carrying the given JSON body.
        pub(crate) fn ok_json(body: serde_json::Value) -> Result<TransportResponse> {
            Ok(TransportResponse {
                status: 200,
                headers: HeaderMap::new(),
                body: body.to_string().into_bytes(),
            })
        }

        /// Requests seen so far, in arrival order.
        pub(crate) fn requests(&self) -> Vec<TransportRequest> {
            self.requests.lock().unwrap().clone()
        }

        /// Multipart uploads seen so far, in arrival order.
        pub(crate) fn multiparts(&self) -> Vec<MultipartRequest> {
            self.multiparts.lock().unwrap().clone()
        }

        fn pop(&self) -> Result<TransportResponse> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::internal("no scripted response left")))
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
            self.requests.lock().unwrap().push(request);
            self.pop()
        }

        async fn execute_stream(&self, _request: TransportRequest) -> Result<SseStream> {
            Err(Error::internal("streaming is not scripted"))
        }

        async fn execute_multipart(&self, request: MultipartRequest) -> Result<TransportResponse> {
            self.multiparts.lock().unwrap().push(request);
            self.pop()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> Config {
        Config::new("test-key")
            .with_host("127.0.0.1")
            .with_port(1)
            .with_insecure(true)
    }

    #[test]
    fn test_connection_state_names() {
        assert_eq!(ConnectionState::Idle.as_str(), "idle");
        assert_eq!(ConnectionState::TransientFailure.as_str(), "transient_failure");
        assert_eq!(ConnectionState::Shutdown.to_string(), "shutdown");
    }

    #[test]
    fn test_extract_error_message_forms() {
        assert_eq!(
            extract_error_message(br#"{"error": "bad model"}"#, 400),
            "bad model"
        );
        assert_eq!(
            extract_error_message(br#"{"error": {"message": "no such file"}}"#, 404),
            "no such file"
        );
        assert_eq!(
            extract_error_message(br#"{"message": "slow down"}"#, 429),
            "slow down"
        );
        assert_eq!(extract_error_message(b"plain text", 500), "plain text");
        assert_eq!(extract_error_message(b"", 503), "HTTP 503");
    }

    #[test]
    fn test_request_builders() {
        let request = TransportRequest::get("/files")
            .with_query("limit", "10")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/files");
        assert_eq!(request.query, vec![("limit".to_string(), "10".to_string())]);
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));

        let request = TransportRequest::post("/tokenize-text", serde_json::json!({"text": "hi"}));
        assert_eq!(request.method, Method::POST);
        assert!(request.body.is_some());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_calls() {
        let transport = RestTransport::new(local_config()).unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();

        let health = transport.health().await;
        assert_eq!(health.state, ConnectionState::Shutdown);

        let err = transport
            .execute(TransportRequest::get("/files"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Canceled);

        let err = transport.ensure_connection().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Canceled);
    }

    #[tokio::test]
    async fn test_fresh_transport_is_idle() {
        let transport = RestTransport::new(local_config()).unwrap();
        let health = transport.health().await;
        assert_eq!(health.state, ConnectionState::Idle);
        assert_eq!(health.message, "connection is idle");
        // Nothing to do from idle.
        transport.ensure_connection().await.unwrap();
    }

    #[test]
    fn test_decode_error_is_parsing_kind() {
        let response = TransportResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: b"not json".to_vec(),
        };
        let err = response.decode::<serde_json::Value>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parsing);
    }

    fn mock_server_config(server: &mockito::ServerGuard) -> Config {
        let (host, port) = server
            .host_with_port()
            .rsplit_once(':')
            .map(|(host, port)| (host.to_string(), port.parse::<u16>().unwrap()))
            .unwrap();
        Config::new("test-key")
            .with_host(host)
            .with_port(port)
            .with_insecure(true)
            .with_max_retries(0)
    }

    #[tokio::test]
    async fn test_rest_transport_sends_auth_and_sdk_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/files")
            .match_header("authorization", "Bearer test-key")
            .match_header("x-request-id", mockito::Matcher::Regex(".+".to_string()))
            .match_header("x-environment", "production")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": []}"#)
            .expect(1)
            .create_async()
            .await;

        let transport = RestTransport::new(mock_server_config(&server)).unwrap();
        let response = transport
            .execute(TransportRequest::get("/files"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(transport.health().await.state, ConnectionState::Ready);
    }

    #[tokio::test]
    async fn test_rest_transport_classifies_http_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/files/missing")
            .with_status(404)
            .with_body(r#"{"error": "no such file"}"#)
            .create_async()
            .await;

        let transport = RestTransport::new(mock_server_config(&server)).unwrap();
        let err = transport
            .execute(TransportRequest::get("/files/missing"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status_code(), Some(404));
        assert!(err.to_string().contains("no such file"));
        // A status-coded response proves the connection itself worked.
        assert_eq!(transport.health().await.state, ConnectionState::Ready);
    }

    #[tokio::test]
    async fn test_rest_transport_x_api_key_mode() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/auth/validate")
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let config = mock_server_config(&server).with_x_api_key_auth(true);
        let transport = RestTransport::new(config).unwrap();
        transport
            .execute(TransportRequest::get("/auth/validate"))
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
