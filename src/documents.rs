//! Semantic search over document collections.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transport::{HttpTransport, TransportRequest};

const SEARCH_PATH: &str = "/documents/search";

/// A document search request.
///
/// An empty `collection_ids` searches every collection the key can see.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub collection_ids: Vec<String>,
    pub limit: u32,
}

impl SearchRequest {
    /// Creates a search request with the default limit of 10 results.
    pub fn new<I, S>(query: impl Into<String>, collection_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            query: query.into(),
            collection_ids: collection_ids.into_iter().map(Into::into).collect(),
            limit: 10,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.query.is_empty() {
            return Err(Error::validation("query is required"));
        }
        if self.limit == 0 {
            return Err(Error::validation("search limit must be at least 1, got 0"));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    source: SearchSourceBody<'a>,
    limit: u32,
}

#[derive(Serialize)]
struct SearchSourceBody<'a> {
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    collection_ids: &'a [String],
}

/// One matching chunk from a searched document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchMatch {
    #[serde(default)]
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

/// A decoded search response, matches in relevance order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<SearchMatch>,
}

impl SearchResponse {
    /// The best-scoring match, when there is one.
    pub fn best(&self) -> Option<&SearchMatch> {
        self.matches.first()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Client for the document search endpoint.
#[derive(Clone)]
pub struct DocumentsClient {
    transport: Arc<dyn HttpTransport>,
}

impl DocumentsClient {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Searches across document collections.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        const OPERATION: &str = "search documents";
        request.validate().map_err(|e| e.with_operation(OPERATION))?;
        let body = SearchBody {
            query: &request.query,
            source: SearchSourceBody {
                collection_ids: &request.collection_ids,
            },
            limit: request.limit,
        };
        let body =
            serde_json::to_value(&body).map_err(|e| Error::from(e).with_operation(OPERATION))?;
        let response = self
            .transport
            .execute(TransportRequest::post(SEARCH_PATH, body))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }
}
