//! Deferred chat completions.
//!
//! A deferred completion is submitted once, acknowledged with a request id,
//! and collected later by polling. The service keeps the finished response
//! available until it expires.

use serde::{Deserialize, Serialize};

use crate::chat::message::Message;
use crate::chat::response::ChatResponse;
use crate::error::{Error, Result};

/// Where a deferred completion is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeferredStatus {
    Pending,
    Completed,
    Expired,
    #[default]
    Unknown,
}

impl DeferredStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "expired" => Self::Expired,
            _ => Self::Unknown,
        }
    }

    /// Whether polling can stop.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }
}

impl<'de> serde::Deserialize<'de> for DeferredStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Acknowledgement returned when a deferred completion is submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeferredSubmission {
    pub request_id: String,
}

/// One poll result for a deferred completion.
///
/// `response` is populated only once `status` is completed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeferredResponse {
    #[serde(default)]
    pub status: DeferredStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChatResponse>,
}

/// A chat completion to run detached from the submitting connection.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeferredRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_encrypted_content: Option<bool>,
}

impl DeferredRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
            store_messages: None,
            previous_response_id: None,
            use_encrypted_content: None,
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

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
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

    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(Error::validation("model is required"));
        }
        if self.messages.is_empty() {
            return Err(Error::validation("at least one message is required"));
        }
        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(Error::validation(format!(
                "temperature must be between 0.0 and 2.0, got {temperature}"
            )));
        }
        if let Some(max_tokens) = self.max_tokens
            && !(1..=8192).contains(&max_tokens)
        {
            return Err(Error::validation(format!(
                "max_tokens must be between 1 and 8192, got {max_tokens}"
            )));
        }
        Ok(())
    }
}
