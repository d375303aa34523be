//! Model catalog: capabilities and pricing for the hosted models.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transport::{HttpTransport, TransportRequest};

const LANGUAGE_MODELS_PATH: &str = "/language-models";
const EMBEDDING_MODELS_PATH: &str = "/embedding-models";
const IMAGE_GENERATION_MODELS_PATH: &str = "/image-generation-models";

/// A chat/completions model's catalog entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LanguageModel {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_modalities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_modalities: Vec<String>,
    #[serde(default)]
    pub prompt_text_token_price: i64,
    #[serde(default)]
    pub prompt_image_token_price: i64,
    #[serde(default)]
    pub cached_prompt_token_price: i64,
    #[serde(default)]
    pub completion_text_token_price: i64,
    #[serde(default)]
    pub search_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_prompt_length: u32,
    #[serde(default)]
    pub system_fingerprint: String,
}

/// An embeddings model's catalog entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingModel {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_modalities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_modalities: Vec<String>,
    #[serde(default)]
    pub prompt_text_token_price: i64,
    #[serde(default)]
    pub prompt_image_token_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub system_fingerprint: String,
}

/// An image generation model's catalog entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageGenerationModel {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_modalities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_modalities: Vec<String>,
    #[serde(default)]
    pub image_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_prompt_length: u32,
    #[serde(default)]
    pub system_fingerprint: String,
}

#[derive(Deserialize)]
struct ModelListing<T> {
    #[serde(default)]
    models: Vec<T>,
}

/// Client for the model catalog endpoints.
#[derive(Clone)]
pub struct ModelsClient {
    transport: Arc<dyn HttpTransport>,
}

impl ModelsClient {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub async fn list_language_models(&self) -> Result<Vec<LanguageModel>> {
        self.list_models(LANGUAGE_MODELS_PATH, "list language models")
            .await
    }

    pub async fn get_language_model(&self, name: &str) -> Result<LanguageModel> {
        self.get_model(LANGUAGE_MODELS_PATH, name, "get language model")
            .await
    }

    pub async fn list_embedding_models(&self) -> Result<Vec<EmbeddingModel>> {
        self.list_models(EMBEDDING_MODELS_PATH, "list embedding models")
            .await
    }

    pub async fn get_embedding_model(&self, name: &str) -> Result<EmbeddingModel> {
        self.get_model(EMBEDDING_MODELS_PATH, name, "get embedding model")
            .await
    }

    pub async fn list_image_generation_models(&self) -> Result<Vec<ImageGenerationModel>> {
        self.list_models(IMAGE_GENERATION_MODELS_PATH, "list image generation models")
            .await
    }

    pub async fn get_image_generation_model(&self, name: &str) -> Result<ImageGenerationModel> {
        self.get_model(IMAGE_GENERATION_MODELS_PATH, name, "get image generation model")
            .await
    }

    async fn list_models<T>(&self, path: &str, operation: &str) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let response = self
            .transport
            .execute(TransportRequest::get(path))
            .await
            .map_err(|e| e.with_operation(operation))?;
        let listing: ModelListing<T> =
            response.decode().map_err(|e| e.with_operation(operation))?;
        Ok(listing.models)
    }

    async fn get_model<T>(&self, base: &str, name: &str, operation: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        if name.is_empty() {
            return Err(Error::validation("model name is required").with_operation(operation));
        }
        let path = format!("{base}/{}", urlencoding::encode(name));
        let response = self
            .transport
            .execute(TransportRequest::get(path))
            .await
            .map_err(|e| e.with_operation(operation))?;
        response.decode().map_err(|e| e.with_operation(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::testing::ScriptedTransport;

    fn scripted_client(
        responses: Vec<Result<crate::transport::TransportResponse>>,
    ) -> (ModelsClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(responses));
        (ModelsClient::new(transport.clone()), transport)
    }

    fn language_model_json(name: &str) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "aliases": ["latest"],
            "version": "1.2.0",
            "input_modalities": ["text", "image"],
            "output_modalities": ["text"],
            "prompt_text_token_price": 20000,
            "completion_text_token_price": 100000,
            "created": "2024-03-15T00:00:00Z",
            "max_prompt_length": 131072,
            "system_fingerprint": "fp_abc"
        })
    }

    #[tokio::test]
    async fn test_list_language_models_decodes_catalog() {
        let (client, transport) = scripted_client(vec![ScriptedTransport::ok_json(
            serde_json::json!({
                "models": [language_model_json("grok-3"), language_model_json("grok-3-mini")]
            }),
        )]);

        let models = client.list_language_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "grok-3");
        assert_eq!(models[0].aliases, vec!["latest"]);
        assert_eq!(models[0].input_modalities, vec!["text", "image"]);
        assert_eq!(models[0].max_prompt_length, 131072);
        assert!(models[0].created.is_some());

        assert_eq!(transport.requests()[0].path, "/language-models");
    }

    #[tokio::test]
    async fn test_get_model_paths_per_family() {
        let (client, transport) = scripted_client(vec![
            ScriptedTransport::ok_json(language_model_json("grok-3")),
            ScriptedTransport::ok_json(serde_json::json!({"name": "embed-1"})),
            ScriptedTransport::ok_json(serde_json::json!({"name": "image-1"})),
        ]);

        client.get_language_model("grok-3").await.unwrap();
        let embedding = client.get_embedding_model("embed-1").await.unwrap();
        assert_eq!(embedding.name, "embed-1");
        let image = client.get_image_generation_model("image-1").await.unwrap();
        assert_eq!(image.name, "image-1");

        let paths: Vec<String> = transport.requests().iter().map(|r| r.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                "/language-models/grok-3",
                "/embedding-models/embed-1",
                "/image-generation-models/image-1",
            ]
        );
    }

    #[tokio::test]
    async fn test_get_requires_model_name() {
        let (client, transport) = scripted_client(vec![]);
        let err = client.get_language_model("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "get language model: model name is required");

        let err = client.get_embedding_model("").await.unwrap_err();
        assert_eq!(err.message(), "get embedding model: model name is required");

        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_list_tolerates_missing_models_key() {
        let (client, _transport) =
            scripted_client(vec![ScriptedTransport::ok_json(serde_json::json!({}))]);
        let models = client.list_image_generation_models().await.unwrap();
        assert!(models.is_empty());
    }
}
