//! API key introspection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transport::{HttpTransport, TransportRequest};

const VALIDATE_PATH: &str = "/auth/validate";
const KEYS_PATH: &str = "/auth/keys";

/// An API key's metadata. The key itself only ever appears redacted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiKey {
    #[serde(default)]
    pub redacted_api_key: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub team_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acls: Vec<String>,
    #[serde(default)]
    pub api_key_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modify_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub api_key_blocked: bool,
    #[serde(default)]
    pub modified_by: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub team_blocked: bool,
}

impl ApiKey {
    /// Whether the key can currently authenticate requests.
    pub fn is_usable(&self) -> bool {
        !self.api_key_blocked && !self.team_blocked && !self.disabled
    }
}

#[derive(Deserialize)]
struct KeyList {
    #[serde(default)]
    keys: Vec<ApiKey>,
}

/// Client for the auth endpoints.
#[derive(Clone)]
pub struct AuthClient {
    transport: Arc<dyn HttpTransport>,
}

impl AuthClient {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Validates the client's configured API key and returns its metadata.
    pub async fn validate_key(&self) -> Result<ApiKey> {
        const OPERATION: &str = "validate api key";
        let response = self
            .transport
            .execute(TransportRequest::get(VALIDATE_PATH))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Fetches one API key's metadata by its id.
    pub async fn get_key(&self, api_key_id: &str) -> Result<ApiKey> {
        const OPERATION: &str = "get api key";
        if api_key_id.is_empty() {
            return Err(Error::validation("api key id is required").with_operation(OPERATION));
        }
        let path = format!("{KEYS_PATH}/{}", urlencoding::encode(api_key_id));
        let response = self
            .transport
            .execute(TransportRequest::get(path))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Lists the API keys visible to the authenticated user.
    pub async fn list_keys(&self) -> Result<Vec<ApiKey>> {
        const OPERATION: &str = "list api keys";
        let response = self
            .transport
            .execute(TransportRequest::get(KEYS_PATH))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        let list: KeyList = response.decode().map_err(|e| e.with_operation(OPERATION))?;
        Ok(list.keys)
    }
}
