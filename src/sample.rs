//! Legacy text completions over raw prompts.
//!
//! Prefer [`crate::chat`] for new work; this endpoint survives for models
//! and callers that still speak the prompt-in, text-out shape.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transport::{HttpTransport, TransportRequest};

const COMPLETIONS_PATH: &str = "/completions";

/// A raw text completion request.
///
/// `max_tokens`, `n`, and `temperature` always go on the wire with their
/// defaults of 100, 1, and 1.0.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SampleRequest {
    pub prompt: Vec<String>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<u32>,
    pub max_tokens: u32,
    pub n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl SampleRequest {
    pub fn new<I, S>(model: impl Into<String>, prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prompt: prompts.into_iter().map(Into::into).collect(),
            model: model.into(),
            logprobs: None,
            top_logprobs: None,
            max_tokens: 100,
            n: 1,
            presence_penalty: None,
            seed: None,
            stop: Vec::new(),
            frequency_penalty: None,
            temperature: 1.0,
            top_p: None,
            user: None,
        }
    }

    /// Appends one prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt.push(prompt.into());
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

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_n(mut self, n: u32) -> Self {
        self.n = n;
        self
    }

    pub fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

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

    pub fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(Error::validation("model is required"));
        }
        if self.prompt.is_empty() {
            return Err(Error::validation("at least one prompt is required"));
        }
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(Error::validation(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// One completion for one prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SampleChoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub text: String,
}

/// A decoded text completion response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SampleResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<SampleChoice>,
    #[serde(default)]
    pub model: String,
}

impl SampleResponse {
    /// The first choice's text, or empty when there are no choices.
    pub fn text(&self) -> &str {
        self.choices.first().map(|c| c.text.as_str()).unwrap_or("")
    }

    pub fn choice(&self, index: usize) -> Option<&SampleChoice> {
        self.choices.get(index)
    }
}

/// Client for the legacy text completion endpoint.
#[derive(Clone)]
pub struct SampleClient {
    transport: Arc<dyn HttpTransport>,
}

impl SampleClient {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Samples completions for every prompt in the request.
    pub async fn sample(&self, request: &SampleRequest) -> Result<SampleResponse> {
        const OPERATION: &str = "sample text";
        request.validate().map_err(|e| e.with_operation(OPERATION))?;
        let body =
            serde_json::to_value(request).map_err(|e| Error::from(e).with_operation(OPERATION))?;
        let response = self
            .transport
            .execute(TransportRequest::post(COMPLETIONS_PATH, body))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }
}
