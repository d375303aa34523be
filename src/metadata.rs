//! Per-request SDK metadata.
//!
//! Every outgoing call carries a small set of correlation headers: the SDK
//! name/version, the deployment environment, the user agent, and optional
//! request / conversation ids. [`SdkMetadata`] holds those values and
//! materializes them as HTTP headers; [`SdkMetadata::sanitized`] produces a
//! redacted view safe for logging.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::config::Config;
use crate::defaults;
use crate::error::{Error, Result};

/// Correlation metadata attached to outgoing requests.
#[derive(Debug, Clone)]
pub struct SdkMetadata {
    /// Correlation id for one request; generated when unset.
    pub request_id: Option<String>,
    /// SDK name/version tag.
    pub client_version: String,
    /// Deployment environment tag.
    pub environment: String,
    /// Correlation id spanning a conversation of requests.
    pub conversation_id: Option<String>,
    /// User agent string.
    pub user_agent: String,
}

impl SdkMetadata {
    /// Builds metadata from the client configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_id: None,
            client_version: format!("xai-sdk-rust/{}", defaults::SDK_VERSION),
            environment: config.environment.clone(),
            conversation_id: None,
            user_agent: config.user_agent.clone(),
        }
    }

    /// Sets an explicit request id instead of a generated one.
    pub fn with_request_id<S: Into<String>>(mut self, request_id: S) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Tags requests with a conversation id.
    pub fn with_conversation_id<S: Into<String>>(mut self, conversation_id: S) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Materializes the metadata as HTTP headers.
    ///
    /// A fresh request id is generated when none was set, so every call is
    /// individually correlatable.
    pub fn to_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let request_id = self
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        insert(&mut headers, defaults::headers::REQUEST_ID, &request_id)?;
        insert(
            &mut headers,
            defaults::headers::CLIENT_VERSION,
            &self.client_version,
        )?;
        if !self.environment.is_empty() {
            insert(
                &mut headers,
                defaults::headers::ENVIRONMENT,
                &self.environment,
            )?;
        }
        if let Some(conversation_id) = &self.conversation_id {
            insert(
                &mut headers,
                defaults::headers::CONVERSATION_ID,
                conversation_id,
            )?;
        }
        if !self.user_agent.is_empty() {
            let value = HeaderValue::from_str(&self.user_agent)
                .map_err(|e| Error::config(format!("invalid user agent: {e}")))?;
            headers.insert(USER_AGENT, value);
        }

        Ok(headers)
    }

    /// Redacted view for logging. Never contains the API key; ids and tags
    /// pass through unchanged.
    pub fn sanitized(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        if let Some(request_id) = &self.request_id {
            out.insert("request_id".to_string(), request_id.clone());
        }
        out.insert("client_version".to_string(), self.client_version.clone());
        out.insert("environment".to_string(), self.environment.clone());
        if let Some(conversation_id) = &self.conversation_id {
            out.insert("conversation_id".to_string(), conversation_id.clone());
        }
        out.insert("user_agent".to_string(), self.user_agent.clone());
        out
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<()> {
    let name = HeaderName::from_static(name);
    let value = HeaderValue::from_str(value)
        .map_err(|e| Error::config(format!("invalid value for header {name}: {e}")))?;
    headers.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_carry_sdk_tags() {
        let config = Config::new("k").with_environment("staging");
        let metadata = SdkMetadata::from_config(&config)
            .with_request_id("req-1")
            .with_conversation_id("conv-9");
        let headers = metadata.to_headers().unwrap();

        assert_eq!(headers.get("x-request-id").unwrap(), "req-1");
        assert_eq!(headers.get("x-conversation-id").unwrap(), "conv-9");
        assert_eq!(headers.get("x-environment").unwrap(), "staging");
        let version = headers.get("x-client-version").unwrap().to_str().unwrap();
        assert!(version.starts_with("xai-sdk-rust/"));
    }

    #[test]
    fn test_request_id_generated_when_unset() {
        let config = Config::new("k");
        let metadata = SdkMetadata::from_config(&config);
        let first = metadata.to_headers().unwrap();
        let second = metadata.to_headers().unwrap();
        // Generated per call, never reused.
        assert_ne!(first.get("x-request-id"), second.get("x-request-id"));
    }

    #[test]
    fn test_sanitized_view_has_no_secrets() {
        let config = Config::new("super-secret-key");
        let view = SdkMetadata::from_config(&config).sanitized();
        for value in view.values() {
            assert!(!value.contains("super-secret-key"));
        }
    }

    #[test]
    fn test_invalid_header_value_is_config_error() {
        let config = Config::new("k").with_environment("bad\nvalue");
        let metadata = SdkMetadata::from_config(&config);
        let err = metadata.to_headers().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
