//! Chat completions: synchronous, streaming, structured, and deferred.
//!
//! [`ChatRequest`] is a fluent builder over the wire format; nothing is sent
//! until a [`ChatClient`] method is called, and every method validates the
//! request first. Responses come back as [`ChatResponse`] (unary),
//! [`ChatStream`] (streaming), or a typed value via [`ChatClient::parse`].

pub mod deferred;
pub mod message;
pub mod response;
pub mod search;
pub mod stream;
pub mod tools;

pub use deferred::{DeferredRequest, DeferredResponse, DeferredStatus, DeferredSubmission};
pub use message::{ContentPart, ImageDetail, ImageUrl, Message, Role};
pub use response::{
    ChatChunk, ChatResponse, Choice, ChunkChoice, CollectionsCitation, DebugOutput,
    InlineCitation, LogProb, LogProbs, MessageDelta, ResponseMessage, TokenUsage, TopLogProb,
    WebCitation, XCitation,
};
pub use search::{
    NewsSource, RssSource, SearchMode, SearchParameters, SearchRecency, SearchSource, WebSource,
    XSource,
};
pub use stream::ChatStream;
pub use tools::{
    CodeExecutionTool, CollectionsSearchTool, DocumentSearchTool, FunctionCall, IncludeOption,
    McpTool, ServerTool, Tool, ToolCall, ToolCallStatus, ToolCallType, ToolChoice, ToolResult,
    ToolSpec, WebSearchTool, XSearchTool,
};

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::transport::{HttpTransport, TransportRequest};

const COMPLETIONS_PATH: &str = "/chat/completions";
const DEFERRED_PATH: &str = "/chat/deferred-completion";

/// How much effort the model spends reasoning before answering.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
    Invalid,
}

impl<'de> serde::Deserialize<'de> for ReasoningEffort {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

impl ReasoningEffort {
    /// Parses an effort string. Unknown values convert to the invalid
    /// sentinel, which request validation rejects.
    pub fn parse(effort: &str) -> Self {
        match effort {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Invalid,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Invalid => "invalid",
        }
    }
}

/// Output shape constraint for the completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
    JsonSchema {
        json_schema: serde_json::Value,
    },
    #[serde(other)]
    Invalid,
}

impl ResponseFormat {
    pub fn text() -> Self {
        Self::Text
    }

    pub fn json_object() -> Self {
        Self::JsonObject
    }

    pub fn json_schema(schema: serde_json::Value) -> Self {
        Self::JsonSchema {
            json_schema: schema,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::JsonSchema { json_schema } if json_schema.is_null() => {
                Err(Error::validation("schema is required for json_schema format"))
            }
            Self::Invalid => Err(Error::validation("response format is invalid")),
            _ => Ok(()),
        }
    }
}

/// A chat completion request.
///
/// Build with `new` plus `with_*` calls; later calls win on the same field.
/// Validation happens when the request is handed to a [`ChatClient`] method,
/// not while building, so partial requests can be assembled freely.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_encrypted_content: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_parameters: Option<SearchParameters>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<IncludeOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            top_p: None,
            max_tokens: None,
            n: None,
            seed: None,
            stop: Vec::new(),
            user: None,
            reasoning_effort: None,
            parallel_tool_calls: None,
            store_messages: None,
            previous_response_id: None,
            use_encrypted_content: None,
            response_format: None,
            tools: Vec::new(),
            tool_choice: None,
            search_parameters: None,
            include: Vec::new(),
            logprobs: None,
            top_logprobs: None,
        }
    }

    /// Replaces the message list.
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages = messages.into_iter().collect();
        self
    }

    /// Appends one message.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Appends the first choice of a previous response, so the conversation
    /// can continue from it. Tool calls and encrypted reasoning content are
    /// carried over; plain reasoning content is not resent.
    pub fn append_response(mut self, response: &ChatResponse) -> Self {
        let Some(choice) = response.choices.first() else {
            return self;
        };
        let mut message = Message::new(Role::Assistant);
        if !choice.message.content.is_empty() {
            message = message.with_part(ContentPart::text(&choice.message.content));
        }
        if !choice.message.tool_calls.is_empty() {
            message = message.with_tool_calls(choice.message.tool_calls.clone());
        }
        if let Some(encrypted) = &choice.message.encrypted_content {
            message = message.with_encrypted_content(encrypted);
        }
        self.messages.push(message);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Requests `n` parallel completions for the same prompt.
    pub fn with_n(mut self, n: u32) -> Self {
        self.n = Some(n);
        self
    }

    /// Seeds sampling for best-effort reproducibility.
    pub fn with_seed(mut self, seed: i32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replaces the stop sequences.
    pub fn with_stop<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }

    /// Tags the request with an end-user identifier for abuse tracking.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    pub fn with_parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.parallel_tool_calls = Some(parallel);
        self
    }

    /// Asks the service to store the conversation server-side.
    pub fn with_store_messages(mut self, store: bool) -> Self {
        self.store_messages = Some(store);
        self
    }

    /// Continues a stored conversation.
    pub fn with_previous_response_id(mut self, response_id: impl Into<String>) -> Self {
        self.previous_response_id = Some(response_id.into());
        self
    }

    /// Requests encrypted reasoning content for stateless multi-turn use.
    pub fn with_encrypted_content(mut self, use_encrypted: bool) -> Self {
        self.use_encrypted_content = Some(use_encrypted);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Appends one tool (a function schema or a server-side tool).
    pub fn with_tool(mut self, tool: impl Into<ToolSpec>) -> Self {
        self.tools.push(tool.into());
        self
    }

    /// Replaces the tool list.
    pub fn with_tools<I, T>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ToolSpec>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn with_search_parameters(mut self, parameters: SearchParameters) -> Self {
        self.search_parameters = Some(parameters);
        self
    }

    /// Asks for an extra response payload.
    pub fn with_include(mut self, option: IncludeOption) -> Self {
        self.include.push(option);
        self
    }

    pub fn with_logprobs(mut self, logprobs: bool) -> Self {
        self.logprobs = Some(logprobs);
        self
    }

    pub fn with_top_logprobs(mut self, top_logprobs: u32) -> Self {
        self.top_logprobs = Some(top_logprobs);
        self
    }

    /// Checks the request against the ranges and exclusivity rules the
    /// service enforces, so malformed requests fail before transmission.
    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(Error::validation("model is required"));
        }
        if self.messages.is_empty() {
            return Err(Error::validation("at least one message is required"));
        }
        for message in &self.messages {
            if message.role == Role::Invalid {
                return Err(Error::validation("message role is invalid"));
            }
            if message.role == Role::Tool && message.tool_call_id.is_none() {
                return Err(Error::validation("tool message requires a tool call id"));
            }
            if message.is_empty() {
                return Err(Error::validation("message content cannot be empty"));
            }
        }
        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(Error::validation(format!(
                "temperature must be between 0.0 and 2.0, got {temperature}"
            )));
        }
        if let Some(top_p) = self.top_p
            && !(0.0..=1.0).contains(&top_p)
        {
            return Err(Error::validation(format!(
                "top_p must be between 0.0 and 1.0, got {top_p}"
            )));
        }
        if let Some(max_tokens) = self.max_tokens
            && !(1..=8192).contains(&max_tokens)
        {
            return Err(Error::validation(format!(
                "max_tokens must be between 1 and 8192, got {max_tokens}"
            )));
        }
        if self.n == Some(0) {
            return Err(Error::validation("n must be at least 1, got 0"));
        }
        if self.reasoning_effort == Some(ReasoningEffort::Invalid) {
            return Err(Error::validation(
                "reasoning effort must be low, medium, or high",
            ));
        }
        for tool in &self.tools {
            tool.validate()?;
        }
        if self.tool_choice == Some(ToolChoice::Invalid) {
            return Err(Error::validation("tool choice is invalid"));
        }
        for option in &self.include {
            if *option == IncludeOption::Invalid {
                return Err(Error::validation("include option is invalid"));
            }
        }
        if let Some(format) = &self.response_format {
            format.validate()?;
        }
        if let Some(parameters) = &self.search_parameters {
            parameters.validate()?;
        }
        Ok(())
    }
}

/// Client for the chat completion endpoints.
#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn HttpTransport>,
}

impl ChatClient {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Samples one completion synchronously.
    pub async fn sample(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.complete(request, "sample completion").await
    }

    /// Starts a streaming completion. The returned [`ChatStream`] yields
    /// chunks as the model produces them.
    pub async fn stream(&self, request: &ChatRequest) -> Result<ChatStream> {
        const OPERATION: &str = "stream completion";
        request.validate().map_err(|e| e.with_operation(OPERATION))?;
        let mut body =
            serde_json::to_value(request).map_err(|e| Error::from(e).with_operation(OPERATION))?;
        if let Some(object) = body.as_object_mut() {
            object.insert("stream".to_string(), serde_json::Value::Bool(true));
        }
        let events = self
            .transport
            .execute_stream(TransportRequest::post(COMPLETIONS_PATH, body))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        Ok(ChatStream::new(events))
    }

    /// Samples a completion constrained to JSON and decodes it into `T`.
    ///
    /// When the request carries no response format, a JSON-object constraint
    /// is applied; pass [`ResponseFormat::json_schema`] for stricter shapes.
    pub async fn parse<T: serde::de::DeserializeOwned>(
        &self,
        request: &ChatRequest,
    ) -> Result<(ChatResponse, T)> {
        const OPERATION: &str = "parse completion";
        let mut request = request.clone();
        if request.response_format.is_none() {
            request.response_format = Some(ResponseFormat::json_object());
        }
        let response = self.complete(&request, OPERATION).await?;
        let content = response.content();
        if content.is_empty() {
            return Err(
                Error::parsing("completion contained no content to parse")
                    .with_operation(OPERATION),
            );
        }
        let parsed =
            serde_json::from_str(content).map_err(|e| Error::from(e).with_operation(OPERATION))?;
        Ok((response, parsed))
    }

    /// Submits a completion to run detached; returns the id to poll with.
    pub async fn defer(&self, request: &DeferredRequest) -> Result<DeferredSubmission> {
        const OPERATION: &str = "submit deferred completion";
        request.validate().map_err(|e| e.with_operation(OPERATION))?;
        let body =
            serde_json::to_value(request).map_err(|e| Error::from(e).with_operation(OPERATION))?;
        let response = self
            .transport
            .execute(TransportRequest::post(DEFERRED_PATH, body))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Fetches the current status of a deferred completion.
    pub async fn get_deferred(&self, request_id: &str) -> Result<DeferredResponse> {
        self.fetch_deferred(request_id, "get deferred completion")
            .await
    }

    /// Polls a deferred completion with the default interval and deadline.
    pub async fn poll_deferred(&self, request_id: &str) -> Result<ChatResponse> {
        self.poll_deferred_with(
            request_id,
            defaults::deferred::POLL_INTERVAL,
            defaults::deferred::POLL_TIMEOUT,
        )
        .await
    }

    /// Polls a deferred completion at a fixed interval until it completes,
    /// expires, or the deadline passes.
    pub async fn poll_deferred_with(
        &self,
        request_id: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<ChatResponse> {
        const OPERATION: &str = "poll deferred completion";
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let result = self.fetch_deferred(request_id, OPERATION).await?;
            match result.status {
                DeferredStatus::Completed => {
                    return result.response.ok_or_else(|| {
                        Error::internal("deferred completion finished without a response")
                            .with_operation(OPERATION)
                    });
                }
                DeferredStatus::Expired => {
                    return Err(Error::timeout("deferred completion expired before it finished")
                        .with_operation(OPERATION));
                }
                DeferredStatus::Pending | DeferredStatus::Unknown => {}
            }
            if tokio::time::Instant::now() + interval > deadline {
                return Err(Error::timeout(format!(
                    "deferred completion {request_id} did not finish within {timeout:?}"
                ))
                .with_operation(OPERATION));
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn complete(&self, request: &ChatRequest, operation: &str) -> Result<ChatResponse> {
        request.validate().map_err(|e| e.with_operation(operation))?;
        let body =
            serde_json::to_value(request).map_err(|e| Error::from(e).with_operation(operation))?;
        let response = self
            .transport
            .execute(TransportRequest::post(COMPLETIONS_PATH, body))
            .await
            .map_err(|e| e.with_operation(operation))?;
        response.decode().map_err(|e| e.with_operation(operation))
    }

    async fn fetch_deferred(&self, request_id: &str, operation: &str) -> Result<DeferredResponse> {
        let path = format!("{DEFERRED_PATH}/{}", urlencoding::encode(request_id));
        let response = self
            .transport
            .execute(TransportRequest::get(path))
            .await
            .map_err(|e| e.with_operation(operation))?;
        response.decode().map_err(|e| e.with_operation(operation))
    }
}
