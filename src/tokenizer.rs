//! Text tokenization against server-side model vocabularies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transport::{HttpTransport, TransportRequest};

const TOKENIZE_PATH: &str = "/tokenize-text";

/// One token produced by a model's tokenizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Token {
    #[serde(default)]
    pub token_id: u32,
    #[serde(default)]
    pub string_token: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_bytes: Vec<u8>,
}

/// A tokenize request for one model over one text.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TokenizeRequest {
    pub model: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl TokenizeRequest {
    pub fn new(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            text: text.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(Error::validation("model is required"));
        }
        if self.text.is_empty() {
            return Err(Error::validation("text is required"));
        }
        Ok(())
    }
}

/// A decoded tokenize response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenizeResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub model: String,
}

impl TokenizeResponse {
    /// The token ids in text order.
    pub fn token_ids(&self) -> Vec<u32> {
        self.tokens.iter().map(|token| token.token_id).collect()
    }

    pub fn count(&self) -> usize {
        self.tokens.len()
    }
}

/// Client for the tokenizer endpoint.
#[derive(Clone)]
pub struct TokenizerClient {
    transport: Arc<dyn HttpTransport>,
}

impl TokenizerClient {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Tokenizes the request's text with the named model's vocabulary.
    pub async fn tokenize(&self, request: &TokenizeRequest) -> Result<TokenizeResponse> {
        const OPERATION: &str = "tokenize text";
        request.validate().map_err(|e| e.with_operation(OPERATION))?;
        let body =
            serde_json::to_value(request).map_err(|e| Error::from(e).with_operation(OPERATION))?;
        let response = self
            .transport
            .execute(TransportRequest::post(TOKENIZE_PATH, body))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }
}
