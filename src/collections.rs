//! Document collections: collection CRUD and document membership.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::listing::ListOptions;
use crate::transport::{HttpTransport, TransportRequest};

const COLLECTIONS_PATH: &str = "/collections";

/// A collection's metadata snapshot.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Collection {
    #[serde(default, rename = "collection_id")]
    pub id: String,
    #[serde(default, rename = "collection_name")]
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub documents_count: u32,
}

/// One page of collections plus the token for the next page.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CollectionList {
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub pagination_token: Option<String>,
}

/// Where a document is in its indexing lifecycle.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Unknown,
    Processing,
    Ready,
    Failed,
}

impl DocumentStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "processing" => Self::Processing,
            "ready" => Self::Ready,
            "failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// Whether indexing has finished, successfully or not.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl<'de> serde::Deserialize<'de> for DocumentStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// A document's metadata snapshot, flattened from the nested wire form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub file_id: String,
    pub name: String,
    pub size_bytes: i64,
    pub content_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub hash: String,
    pub status: DocumentStatus,
    pub error_message: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Default, Deserialize)]
struct DocumentWire {
    #[serde(default)]
    file_metadata: FileMetadataWire,
    #[serde(default)]
    status: DocumentStatus,
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    fields: Vec<FieldEntry>,
}

#[derive(Default, Deserialize)]
struct FileMetadataWire {
    #[serde(default)]
    file_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    size_bytes: i64,
    #[serde(default)]
    content_type: String,
    #[serde(default)]
    hash: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Key/value metadata entry as it travels on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct FieldEntry {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: String,
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = DocumentWire::deserialize(deserializer)?;
        let meta = wire.file_metadata;
        Ok(Self {
            file_id: meta.file_id,
            name: meta.name,
            size_bytes: meta.size_bytes,
            content_type: meta.content_type,
            created_at: meta.created_at,
            expires_at: meta.expires_at,
            hash: meta.hash,
            status: wire.status,
            error_message: wire.error_message,
            fields: wire.fields.into_iter().map(|f| (f.key, f.value)).collect(),
        })
    }
}

/// One page of documents plus the token for the next page.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub pagination_token: Option<String>,
}

/// Options for creating or renaming a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionOptions {
    pub name: String,
    pub team_id: Option<String>,
}

impl CollectionOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            team_id: None,
        }
    }

    pub fn with_team_id(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }
}

/// Options for adding a file to a collection or updating its metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentOptions {
    pub file_id: String,
    pub team_id: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl DocumentOptions {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            team_id: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_team_id(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// Sets one metadata field, overwriting any previous value.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Replaces the metadata fields.
    pub fn with_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.fields = fields;
        self
    }

    fn field_entries(&self) -> Vec<FieldEntry> {
        self.fields
            .iter()
            .map(|(key, value)| FieldEntry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

#[derive(Serialize)]
struct CreateCollectionBody<'a> {
    collection_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<&'a str>,
}

#[derive(Serialize)]
struct UpdateCollectionBody<'a> {
    collection_id: &'a str,
    collection_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<&'a str>,
}

#[derive(Serialize)]
struct DocumentBody<'a> {
    file_id: &'a str,
    collection_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldEntry>,
}

#[derive(Serialize)]
struct BatchGetBody<'a> {
    collection_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<&'a str>,
    file_ids: &'a [String],
}

#[derive(Deserialize)]
struct BatchDocuments {
    #[serde(default)]
    documents: Vec<Document>,
}

/// Client for the collections endpoints.
#[derive(Clone)]
pub struct CollectionsClient {
    transport: Arc<dyn HttpTransport>,
}

impl CollectionsClient {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Creates a collection.
    pub async fn create(&self, options: &CollectionOptions) -> Result<Collection> {
        const OPERATION: &str = "create collection";
        if options.name.is_empty() {
            return Err(Error::validation("collection name is required").with_operation(OPERATION));
        }
        let body = CreateCollectionBody {
            collection_name: &options.name,
            team_id: options.team_id.as_deref(),
        };
        self.post_json(COLLECTIONS_PATH.to_string(), &body, OPERATION)
            .await
    }

    /// Fetches one collection's metadata.
    pub async fn get(&self, collection_id: &str, team_id: Option<&str>) -> Result<Collection> {
        const OPERATION: &str = "get collection";
        require_collection_id(collection_id, OPERATION)?;
        let mut request = TransportRequest::get(collection_path(collection_id));
        if let Some(team_id) = team_id {
            request = request.with_query("team_id", team_id);
        }
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Lists collections.
    pub async fn list(&self, options: &ListOptions) -> Result<CollectionList> {
        const OPERATION: &str = "list collections";
        let mut request = TransportRequest::get(COLLECTIONS_PATH);
        request.query = options.to_query();
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Renames a collection.
    pub async fn update(
        &self,
        collection_id: &str,
        options: &CollectionOptions,
    ) -> Result<Collection> {
        const OPERATION: &str = "update collection";
        require_collection_id(collection_id, OPERATION)?;
        if options.name.is_empty() {
            return Err(Error::validation("collection name is required").with_operation(OPERATION));
        }
        let body = UpdateCollectionBody {
            collection_id,
            collection_name: &options.name,
            team_id: options.team_id.as_deref(),
        };
        let body =
            serde_json::to_value(&body).map_err(|e| Error::from(e).with_operation(OPERATION))?;
        let response = self
            .transport
            .execute(TransportRequest::put(collection_path(collection_id), body))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Deletes a collection.
    pub async fn delete(&self, collection_id: &str, team_id: Option<&str>) -> Result<()> {
        const OPERATION: &str = "delete collection";
        require_collection_id(collection_id, OPERATION)?;
        let mut request = TransportRequest::delete(collection_path(collection_id));
        if let Some(team_id) = team_id {
            request = request.with_query("team_id", team_id);
        }
        self.transport
            .execute(request)
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        Ok(())
    }

    /// Adds an uploaded file to a collection as a document.
    pub async fn add_document(
        &self,
        collection_id: &str,
        options: &DocumentOptions,
    ) -> Result<Document> {
        const OPERATION: &str = "add document";
        require_collection_id(collection_id, OPERATION)?;
        require_file_id(&options.file_id, OPERATION)?;
        let body = DocumentBody {
            file_id: &options.file_id,
            collection_id,
            team_id: options.team_id.as_deref(),
            fields: options.field_entries(),
        };
        self.post_json(documents_path(collection_id), &body, OPERATION)
            .await
    }

    /// Fetches one document's metadata.
    pub async fn get_document(
        &self,
        collection_id: &str,
        file_id: &str,
        team_id: Option<&str>,
    ) -> Result<Document> {
        const OPERATION: &str = "get document";
        require_collection_id(collection_id, OPERATION)?;
        require_file_id(file_id, OPERATION)?;
        let mut request = TransportRequest::get(document_path(collection_id, file_id));
        if let Some(team_id) = team_id {
            request = request.with_query("team_id", team_id);
        }
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Lists the documents in a collection.
    pub async fn list_documents(
        &self,
        collection_id: &str,
        options: &ListOptions,
    ) -> Result<DocumentList> {
        const OPERATION: &str = "list documents";
        require_collection_id(collection_id, OPERATION)?;
        let mut request = TransportRequest::get(documents_path(collection_id));
        request.query = options.to_query();
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Replaces a document's metadata fields.
    pub async fn update_document(
        &self,
        collection_id: &str,
        options: &DocumentOptions,
    ) -> Result<Document> {
        const OPERATION: &str = "update document";
        require_collection_id(collection_id, OPERATION)?;
        require_file_id(&options.file_id, OPERATION)?;
        let body = DocumentBody {
            file_id: &options.file_id,
            collection_id,
            team_id: options.team_id.as_deref(),
            fields: options.field_entries(),
        };
        let body =
            serde_json::to_value(&body).map_err(|e| Error::from(e).with_operation(OPERATION))?;
        let response = self
            .transport
            .execute(TransportRequest::put(
                document_path(collection_id, &options.file_id),
                body,
            ))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Removes a document from a collection. The underlying file survives.
    pub async fn delete_document(
        &self,
        collection_id: &str,
        file_id: &str,
        team_id: Option<&str>,
    ) -> Result<()> {
        const OPERATION: &str = "delete document";
        require_collection_id(collection_id, OPERATION)?;
        require_file_id(file_id, OPERATION)?;
        let mut request = TransportRequest::delete(document_path(collection_id, file_id));
        if let Some(team_id) = team_id {
            request = request.with_query("team_id", team_id);
        }
        self.transport
            .execute(request)
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        Ok(())
    }

    /// Fetches several documents in one call.
    pub async fn batch_get_documents(
        &self,
        collection_id: &str,
        file_ids: &[String],
        team_id: Option<&str>,
    ) -> Result<Vec<Document>> {
        const OPERATION: &str = "batch get documents";
        require_collection_id(collection_id, OPERATION)?;
        if file_ids.is_empty() {
            return Err(
                Error::validation("at least one file id is required").with_operation(OPERATION)
            );
        }
        let body = BatchGetBody {
            collection_id,
            team_id,
            file_ids,
        };
        let batch: BatchDocuments = self
            .post_json(
                format!("{}/batch", documents_path(collection_id)),
                &body,
                OPERATION,
            )
            .await?;
        Ok(batch.documents)
    }

    async fn post_json<B, T>(&self, path: String, body: &B, operation: &str) -> Result<T>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        let body =
            serde_json::to_value(body).map_err(|e| Error::from(e).with_operation(operation))?;
        let response = self
            .transport
            .execute(TransportRequest::post(path, body))
            .await
            .map_err(|e| e.with_operation(operation))?;
        response.decode().map_err(|e| e.with_operation(operation))
    }
}

fn collection_path(collection_id: &str) -> String {
    format!("{COLLECTIONS_PATH}/{}", urlencoding::encode(collection_id))
}

fn documents_path(collection_id: &str) -> String {
    format!("{}/documents", collection_path(collection_id))
}

fn document_path(collection_id: &str, file_id: &str) -> String {
    format!(
        "{}/{}",
        documents_path(collection_id),
        urlencoding::encode(file_id)
    )
}

fn require_collection_id(collection_id: &str, operation: &str) -> Result<()> {
    if collection_id.is_empty() {
        return Err(Error::validation("collection id is required").with_operation(operation));
    }
    Ok(())
}

fn require_file_id(file_id: &str, operation: &str) -> Result<()> {
    if file_id.is_empty() {
        return Err(Error::validation("file id is required").with_operation(operation));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::testing::ScriptedTransport;

    fn scripted_client(
        responses: Vec<Result<crate::transport::TransportResponse>>,
    ) -> (CollectionsClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(responses));
        (CollectionsClient::new(transport.clone()), transport)
    }

    fn collection_json(id: &str, name: &str) -> serde_json::Value {
        serde_json::json!({
            "collection_id": id,
            "collection_name": name,
            "created_at": "2024-04-01T08:30:00Z",
            "documents_count": 3
        })
    }

    fn document_json(file_id: &str) -> serde_json::Value {
        serde_json::json!({
            "file_metadata": {
                "file_id": file_id,
                "name": "paper.pdf",
                "size_bytes": 2048,
                "content_type": "application/pdf",
                "hash": "abc123",
                "created_at": "2024-04-02T09:00:00Z"
            },
            "status": "ready",
            "fields": [{"key": "author", "value": "Ada"}, {"key": "year", "value": "2024"}]
        })
    }

    #[tokio::test]
    async fn test_create_posts_name_and_decodes() {
        let (client, transport) = scripted_client(vec![ScriptedTransport::ok_json(
            collection_json("col-1", "research"),
        )]);

        let collection = client
            .create(&CollectionOptions::new("research").with_team_id("team-1"))
            .await
            .unwrap();
        assert_eq!(collection.id, "col-1");
        assert_eq!(collection.name, "research");
        assert_eq!(collection.documents_count, 3);
        assert!(collection.created_at.is_some());

        let sent = transport.requests();
        assert_eq!(sent[0].path, "/collections");
        assert_eq!(
            sent[0].body,
            Some(serde_json::json!({"collection_name": "research", "team_id": "team-1"}))
        );
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let (client, transport) = scripted_client(vec![]);
        let err = client
            .create(&CollectionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "create collection: collection name is required");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_get_and_delete_carry_team_id_query() {
        let (client, transport) = scripted_client(vec![
            ScriptedTransport::ok_json(collection_json("col-1", "research")),
            ScriptedTransport::ok_json(serde_json::json!({})),
        ]);

        client.get("col-1", Some("team-1")).await.unwrap();
        client.delete("col-1", None).await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].path, "/collections/col-1");
        assert_eq!(sent[0].query, vec![("team_id".to_string(), "team-1".to_string())]);
        assert_eq!(sent[1].method, reqwest::Method::DELETE);
        assert!(sent[1].query.is_empty());
    }

    #[tokio::test]
    async fn test_list_decodes_page() {
        let (client, transport) = scripted_client(vec![ScriptedTransport::ok_json(
            serde_json::json!({
                "collections": [collection_json("col-1", "a"), collection_json("col-2", "b")],
                "pagination_token": "tok-2"
            }),
        )]);

        let page = client.list(&ListOptions::new().with_limit(10)).await.unwrap();
        assert_eq!(page.collections.len(), 2);
        assert_eq!(page.collections[1].id, "col-2");
        assert_eq!(page.pagination_token.as_deref(), Some("tok-2"));

        let sent = transport.requests();
        assert_eq!(sent[0].query, vec![("limit".to_string(), "10".to_string())]);
    }

    #[tokio::test]
    async fn test_update_puts_new_name() {
        let (client, transport) = scripted_client(vec![ScriptedTransport::ok_json(
            collection_json("col-1", "renamed"),
        )]);

        let collection = client
            .update("col-1", &CollectionOptions::new("renamed"))
            .await
            .unwrap();
        assert_eq!(collection.name, "renamed");

        let sent = transport.requests();
        assert_eq!(sent[0].method, reqwest::Method::PUT);
        assert_eq!(sent[0].path, "/collections/col-1");
        assert_eq!(
            sent[0].body,
            Some(serde_json::json!({
                "collection_id": "col-1",
                "collection_name": "renamed"
            }))
        );
    }

    #[tokio::test]
    async fn test_add_document_posts_fields_and_flattens_response() {
        let (client, transport) =
            scripted_client(vec![ScriptedTransport::ok_json(document_json("file-9"))]);

        let options = DocumentOptions::new("file-9")
            .with_field("year", "2024")
            .with_field("author", "Ada");
        let document = client.add_document("col-1", &options).await.unwrap();

        assert_eq!(document.file_id, "file-9");
        assert_eq!(document.name, "paper.pdf");
        assert_eq!(document.size_bytes, 2048);
        assert_eq!(document.content_type, "application/pdf");
        assert_eq!(document.hash, "abc123");
        assert_eq!(document.status, DocumentStatus::Ready);
        assert!(document.status.is_terminal());
        assert_eq!(document.fields["author"], "Ada");
        assert_eq!(document.fields["year"], "2024");

        let sent = transport.requests();
        assert_eq!(sent[0].path, "/collections/col-1/documents");
        // BTreeMap keys serialize in sorted order.
        assert_eq!(
            sent[0].body,
            Some(serde_json::json!({
                "file_id": "file-9",
                "collection_id": "col-1",
                "fields": [
                    {"key": "author", "value": "Ada"},
                    {"key": "year", "value": "2024"}
                ]
            }))
        );
    }

    #[tokio::test]
    async fn test_document_status_tolerates_unknown_values() {
        let mut body = document_json("file-9");
        body["status"] = serde_json::json!("migrating");
        let (client, _transport) = scripted_client(vec![ScriptedTransport::ok_json(body)]);

        let document = client
            .get_document("col-1", "file-9", None)
            .await
            .unwrap();
        assert_eq!(document.status, DocumentStatus::Unknown);
        assert!(!document.status.is_terminal());
    }

    #[tokio::test]
    async fn test_list_documents_and_update_document_paths() {
        let (client, transport) = scripted_client(vec![
            ScriptedTransport::ok_json(serde_json::json!({
                "documents": [document_json("file-1")],
                "pagination_token": "tok"
            })),
            ScriptedTransport::ok_json(document_json("file-1")),
        ]);

        let page = client
            .list_documents("col-1", &ListOptions::new().with_limit(5))
            .await
            .unwrap();
        assert_eq!(page.documents.len(), 1);
        assert_eq!(page.pagination_token.as_deref(), Some("tok"));

        client
            .update_document("col-1", &DocumentOptions::new("file-1").with_field("k", "v"))
            .await
            .unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].path, "/collections/col-1/documents");
        assert_eq!(sent[1].method, reqwest::Method::PUT);
        assert_eq!(sent[1].path, "/collections/col-1/documents/file-1");
    }

    #[tokio::test]
    async fn test_batch_get_documents() {
        let (client, transport) = scripted_client(vec![ScriptedTransport::ok_json(
            serde_json::json!({"documents": [document_json("file-1"), document_json("file-2")]}),
        )]);

        let ids = vec!["file-1".to_string(), "file-2".to_string()];
        let documents = client
            .batch_get_documents("col-1", &ids, Some("team-1"))
            .await
            .unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[1].file_id, "file-2");

        let sent = transport.requests();
        assert_eq!(sent[0].path, "/collections/col-1/documents/batch");
        assert_eq!(
            sent[0].body,
            Some(serde_json::json!({
                "collection_id": "col-1",
                "team_id": "team-1",
                "file_ids": ["file-1", "file-2"]
            }))
        );
    }

    #[tokio::test]
    async fn test_id_validations_fire_before_network() {
        let (client, transport) = scripted_client(vec![]);

        let err = client.get("", None).await.unwrap_err();
        assert_eq!(err.message(), "get collection: collection id is required");

        let err = client
            .add_document("col-1", &DocumentOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "add document: file id is required");

        let err = client
            .batch_get_documents("col-1", &[], None)
            .await
            .unwrap_err();
        assert_eq!(
            err.message(),
            "batch get documents: at least one file id is required"
        );

        assert!(transport.requests().is_empty());
    }
}
