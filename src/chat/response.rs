//! Decoded chat completion responses and streamed chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::message::Role;
use crate::chat::tools::ToolCall;

fn role_invalid() -> Role {
    Role::Invalid
}

/// Token accounting for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_prompt_text_tokens: Option<u32>,
}

/// Log probability of one sampled token.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogProb {
    pub token: String,
    pub logprob: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_logprobs: Vec<TopLogProb>,
}

/// One alternative token the sampler considered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TopLogProb {
    pub token: String,
    pub logprob: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
}

/// Per-choice log probability content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogProbs {
    #[serde(default)]
    pub content: Vec<LogProb>,
}

/// Citation of a web page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebCitation {
    pub url: String,
}

/// Citation of an X post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct XCitation {
    pub url: String,
}

/// Citation of a chunk inside the caller's collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollectionsCitation {
    pub file_id: String,
    #[serde(default)]
    pub chunk_id: String,
    #[serde(default)]
    pub chunk_content: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collection_ids: Vec<String>,
}

/// A citation anchored to a position in the generated text.
///
/// At most one of the payload fields is set, matching the source kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InlineCitation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub start_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_citation: Option<WebCitation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_citation: Option<XCitation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections_citation: Option<CollectionsCitation>,
}

/// Server-side diagnostics returned when debug payloads are requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DebugOutput {
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub request: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<String>,
    #[serde(default)]
    pub cache_read_count: u32,
    #[serde(default)]
    pub cache_read_input_bytes: u64,
    #[serde(default)]
    pub cache_write_count: u32,
    #[serde(default)]
    pub cache_write_input_bytes: u64,
    #[serde(default)]
    pub engine_request: String,
    #[serde(default)]
    pub lb_address: String,
    #[serde(default)]
    pub sampler_tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunks: Vec<String>,
}

/// The assistant message inside one choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseMessage {
    #[serde(default = "role_invalid")]
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inline_citations: Vec<InlineCitation>,
}

/// One of the `n` completions in a response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<LogProbs>,
}

/// A complete chat completion.
///
/// Accessors read through to the first choice and fall back to empty values
/// when the server returned no choices, so callers can chain without
/// null checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_output: Option<DebugOutput>,
}

impl ChatResponse {
    /// Text content of the first choice, empty when there is none.
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .unwrap_or_default()
    }

    /// Role of the first choice's message.
    pub fn role(&self) -> Role {
        self.choices
            .first()
            .map(|choice| choice.message.role)
            .unwrap_or(Role::Invalid)
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
    }

    /// Tool calls requested in the first choice.
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.choices
            .first()
            .map(|choice| choice.message.tool_calls.as_slice())
            .unwrap_or_default()
    }

    pub fn choice(&self, index: usize) -> Option<&Choice> {
        self.choices.get(index)
    }

    pub fn usage(&self) -> Option<&TokenUsage> {
        self.usage.as_ref()
    }

    pub fn reasoning_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.reasoning_content.as_deref())
    }

    pub fn encrypted_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.encrypted_content.as_deref())
    }

    pub fn inline_citations(&self) -> &[InlineCitation] {
        self.choices
            .first()
            .map(|choice| choice.message.inline_citations.as_slice())
            .unwrap_or_default()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
    }
}

/// The incremental fields of one streamed unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_content: Option<String>,
}

/// One choice's slice of a streamed chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: MessageDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// One unit of a streamed chat completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<String>,
}

impl ChatChunk {
    /// Content delta of the first choice, empty when there is none.
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .unwrap_or_default()
    }

    pub fn role(&self) -> Option<Role> {
        self.choices.first().and_then(|choice| choice.delta.role)
    }

    pub fn has_content(&self) -> bool {
        !self.content().is_empty()
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
    }
}
