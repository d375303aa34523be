//! Embeddings over text and image inputs.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::chat::message::{ImageDetail, ImageUrl};
use crate::error::{Error, Result};
use crate::transport::{HttpTransport, TransportRequest};

const EMBEDDINGS_PATH: &str = "/embeddings";

/// How embedding vectors are returned on the wire.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    #[default]
    Float,
    Base64,
}

/// One item to embed: a text passage or an image reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbedInput {
    Text {
        text: String,
    },
    #[serde(rename = "image_url")]
    Image {
        image_url: ImageUrl,
    },
}

impl EmbedInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates an image input with the default (auto) detail level.
    pub fn image(url: impl Into<String>) -> Self {
        Self::Image {
            image_url: ImageUrl {
                url: url.into(),
                detail: ImageDetail::Auto,
            },
        }
    }

    pub fn image_with_detail(url: impl Into<String>, detail: ImageDetail) -> Self {
        Self::Image {
            image_url: ImageUrl {
                url: url.into(),
                detail,
            },
        }
    }
}

/// An embeddings request for one model over a batch of inputs.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedRequest {
    pub model: String,
    pub input: Vec<EmbedInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<EncodingFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl EmbedRequest {
    pub fn new(model: impl Into<String>, inputs: impl IntoIterator<Item = EmbedInput>) -> Self {
        Self {
            model: model.into(),
            input: inputs.into_iter().collect(),
            encoding_format: None,
            user: None,
        }
    }

    /// Appends one input.
    pub fn with_input(mut self, input: EmbedInput) -> Self {
        self.input.push(input);
        self
    }

    pub fn with_encoding_format(mut self, format: EncodingFormat) -> Self {
        self.encoding_format = Some(format);
        self
    }

    /// Tags the request with an end-user identifier for abuse tracking.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(Error::validation("model is required"));
        }
        if self.input.is_empty() {
            return Err(Error::validation("at least one input is required"));
        }
        Ok(())
    }
}

/// One embedding vector, in whichever encoding was requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub float_array: Vec<f32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base64_array: String,
}

impl FeatureVector {
    /// The vector as floats, decoding the base64 form (packed little-endian
    /// f32) when that is what the server sent.
    pub fn to_floats(&self) -> Result<Vec<f32>> {
        if !self.float_array.is_empty() {
            return Ok(self.float_array.clone());
        }
        if self.base64_array.is_empty() {
            return Ok(Vec::new());
        }
        let bytes = BASE64.decode(&self.base64_array).map_err(|e| {
            Error::parsing(format!("embedding payload is not valid base64: {e}"))
        })?;
        if bytes.len() % 4 != 0 {
            return Err(Error::parsing(format!(
                "embedding payload of {} bytes is not a whole number of f32 values",
                bytes.len()
            )));
        }
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}

/// The embeddings produced for one input, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    #[serde(default)]
    pub index: u32,
    #[serde(default, rename = "embeddings", skip_serializing_if = "Vec::is_empty")]
    pub vectors: Vec<FeatureVector>,
}

/// Token accounting for an embeddings request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// A decoded embeddings response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmbedResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeddings: Vec<Embedding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<EmbeddingUsage>,
}

/// Client for the embeddings endpoint.
#[derive(Clone)]
pub struct EmbedClient {
    transport: Arc<dyn HttpTransport>,
}

impl EmbedClient {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Creates embeddings for every input in the request.
    pub async fn create(&self, request: &EmbedRequest) -> Result<EmbedResponse> {
        const OPERATION: &str = "create embeddings";
        request.validate().map_err(|e| e.with_operation(OPERATION))?;
        let body =
            serde_json::to_value(request).map_err(|e| Error::from(e).with_operation(OPERATION))?;
        let response = self
            .transport
            .execute(TransportRequest::post(EMBEDDINGS_PATH, body))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::testing::ScriptedTransport;

    fn scripted_client(
        responses: Vec<Result<crate::transport::TransportResponse>>,
    ) -> (EmbedClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(responses));
        (EmbedClient::new(transport.clone()), transport)
    }

    #[test]
    fn test_input_wire_shapes() {
        let text = serde_json::to_value(EmbedInput::text("hello world")).unwrap();
        assert_eq!(text, serde_json::json!({"type": "text", "text": "hello world"}));

        let image = serde_json::to_value(EmbedInput::image_with_detail(
            "https://example.com/image.jpg",
            ImageDetail::High,
        ))
        .unwrap();
        assert_eq!(
            image,
            serde_json::json!({
                "type": "image_url",
                "image_url": {"url": "https://example.com/image.jpg", "detail": "high"}
            })
        );
    }

    #[test]
    fn test_request_builders() {
        let request = EmbedRequest::new(
            "embed-model",
            [EmbedInput::text("one"), EmbedInput::text("two")],
        )
        .with_input(EmbedInput::image("https://example.com/x.png"))
        .with_encoding_format(EncodingFormat::Base64)
        .with_user("user-1");

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["model"], "embed-model");
        assert_eq!(wire["input"].as_array().unwrap().len(), 3);
        assert_eq!(wire["encoding_format"], "base64");
        assert_eq!(wire["user"], "user-1");

        let bare = serde_json::to_value(EmbedRequest::new("m", [EmbedInput::text("t")])).unwrap();
        assert!(bare.get("encoding_format").is_none());
        assert!(bare.get("user").is_none());
    }

    #[test]
    fn test_validation() {
        let err = EmbedRequest::new("", [EmbedInput::text("x")])
            .validate()
            .unwrap_err();
        assert_eq!(err.message(), "model is required");

        let err = EmbedRequest::new("embed-model", []).validate().unwrap_err();
        assert_eq!(err.message(), "at least one input is required");
    }

    #[tokio::test]
    async fn test_create_posts_and_decodes() {
        let (client, transport) = scripted_client(vec![ScriptedTransport::ok_json(
            serde_json::json!({
                "id": "emb-123",
                "model": "embed-model",
                "embeddings": [{
                    "index": 0,
                    "embeddings": [{"float_array": [0.1, 0.2, 0.3]}]
                }],
                "usage": {"prompt_tokens": 3, "total_tokens": 3}
            }),
        )]);

        let request = EmbedRequest::new("embed-model", [EmbedInput::text("hello")]);
        let response = client.create(&request).await.unwrap();
        assert_eq!(response.id, "emb-123");
        assert_eq!(response.embeddings.len(), 1);
        assert_eq!(response.embeddings[0].vectors[0].to_floats().unwrap().len(), 3);
        assert_eq!(response.usage.unwrap().total_tokens, 3);

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].path, "/embeddings");
        assert_eq!(sent[0].body.as_ref().unwrap()["model"], "embed-model");
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_before_network() {
        let (client, transport) = scripted_client(vec![]);
        let err = client
            .create(&EmbedRequest::new("embed-model", []))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_feature_vector_to_floats() {
        let floats = FeatureVector {
            float_array: vec![0.5, -1.0],
            base64_array: String::new(),
        };
        assert_eq!(floats.to_floats().unwrap(), vec![0.5, -1.0]);

        let mut bytes = Vec::new();
        for value in [0.5f32, -1.0f32] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        let encoded = FeatureVector {
            float_array: Vec::new(),
            base64_array: BASE64.encode(&bytes),
        };
        assert_eq!(encoded.to_floats().unwrap(), vec![0.5, -1.0]);

        let empty = FeatureVector::default();
        assert!(empty.to_floats().unwrap().is_empty());

        let garbage = FeatureVector {
            float_array: Vec::new(),
            base64_array: "!!!not base64!!!".to_string(),
        };
        assert_eq!(garbage.to_floats().unwrap_err().kind(), ErrorKind::Parsing);

        let truncated = FeatureVector {
            float_array: Vec::new(),
            base64_array: BASE64.encode([1u8, 2, 3]),
        };
        assert_eq!(truncated.to_floats().unwrap_err().kind(), ErrorKind::Parsing);
    }
}
