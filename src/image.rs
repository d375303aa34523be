//! Image generation.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::chat::message::{ImageDetail, ImageUrl};
use crate::error::{Error, Result};
use crate::transport::{HttpTransport, TransportRequest};

const GENERATIONS_PATH: &str = "/images/generations";

/// How generated images are returned: as hosted URLs or inline base64.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageFormat {
    #[default]
    #[serde(rename = "url")]
    Url,
    #[serde(rename = "b64_json")]
    Base64,
}

/// An image generation request.
///
/// `n` and `response_format` always go on the wire so the server never has
/// to guess the caller's intent.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub model: String,
    pub n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub response_format: ImageFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageUrl>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            n: 1,
            user: None,
            response_format: ImageFormat::default(),
            image: None,
        }
    }

    /// Asks for `n` images in one call.
    pub fn with_count(mut self, n: u32) -> Self {
        self.n = n;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.response_format = format;
        self
    }

    /// Supplies a source image to steer the generation.
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(ImageUrl {
            url: url.into(),
            detail: ImageDetail::Auto,
        });
        self
    }

    pub fn with_image_detail(mut self, url: impl Into<String>, detail: ImageDetail) -> Self {
        self.image = Some(ImageUrl {
            url: url.into(),
            detail,
        });
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt.is_empty() {
            return Err(Error::validation("prompt is required"));
        }
        if self.model.is_empty() {
            return Err(Error::validation("model is required"));
        }
        if self.n < 1 || self.n > 10 {
            return Err(Error::validation(format!(
                "image count must be between 1 and 10, got {}",
                self.n
            )));
        }
        Ok(())
    }
}

/// One generated image, in whichever format was requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneratedImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsampled_prompt: Option<String>,
    #[serde(default)]
    pub respect_moderation: bool,
}

impl GeneratedImage {
    /// Decodes the inline base64 payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let Some(encoded) = &self.b64_json else {
            return Err(Error::parsing("image carries no base64 payload"));
        };
        BASE64
            .decode(encoded)
            .map_err(|e| Error::parsing(format!("image payload is not valid base64: {e}")))
    }
}

/// A decoded image generation response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<GeneratedImage>,
    #[serde(default)]
    pub model: String,
}

impl ImageResponse {
    /// The first image's URL, when the server returned hosted URLs.
    pub fn url(&self) -> Option<&str> {
        self.images.first().and_then(|image| image.url.as_deref())
    }

    pub fn image(&self, index: usize) -> Option<&GeneratedImage> {
        self.images.get(index)
    }
}

/// Client for the image generation endpoint.
#[derive(Clone)]
pub struct ImageClient {
    transport: Arc<dyn HttpTransport>,
}

impl ImageClient {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Generates one or more images from a text prompt.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<ImageResponse> {
        const OPERATION: &str = "generate image";
        request.validate().map_err(|e| e.with_operation(OPERATION))?;
        let body =
            serde_json::to_value(request).map_err(|e| Error::from(e).with_operation(OPERATION))?;
        let response = self
            .transport
            .execute(TransportRequest::post(GENERATIONS_PATH, body))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }
}
