//! File storage: upload, download, metadata, and batch upload.

use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::defaults;
use crate::error::{Error, Result};
use crate::listing::ListOptions;
use crate::transport::{HttpTransport, MultipartRequest, TransportRequest, TransportResponse};

const FILES_PATH: &str = "/files";

/// Batch uploads run at most this many concurrent requests unless the
/// caller picks a limit.
const DEFAULT_BATCH_CONCURRENCY: usize = 50;

/// A stored file's metadata snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct File {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_id: String,
}

/// One page of files plus the token for the next page.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FileList {
    #[serde(default, rename = "data")]
    pub files: Vec<File>,
    #[serde(default)]
    pub pagination_token: Option<String>,
}

/// Options for a single upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOptions {
    /// Name the file is stored under. Required unless the upload comes from
    /// a path, in which case the on-disk name fills in.
    pub name: String,
    pub purpose: Option<String>,
    /// Size cap override in bytes; the 100 MiB default applies when unset.
    pub max_size: Option<usize>,
}

impl UploadOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            purpose: None,
            max_size: None,
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }
}

/// Outcome of one upload within a batch, tagged with its input index.
#[derive(Debug)]
pub struct BatchUploadResult {
    pub index: usize,
    pub file: Option<File>,
    pub error: Option<Error>,
}

impl BatchUploadResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Deserialize)]
struct FileContent {
    /// Base64-encoded file bytes.
    #[serde(default)]
    data: String,
}

#[derive(Deserialize)]
struct FileUrl {
    #[serde(default)]
    url: String,
}

/// Client for the file storage endpoints.
#[derive(Clone)]
pub struct FilesClient {
    transport: Arc<dyn HttpTransport>,
}

impl FilesClient {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Uploads a file's bytes under the options' name.
    ///
    /// Rejects payloads over the size cap before any network activity.
    pub async fn upload(&self, data: Vec<u8>, options: &UploadOptions) -> Result<File> {
        const OPERATION: &str = "upload file";
        if options.name.is_empty() {
            return Err(Error::validation("file name is required").with_operation(OPERATION));
        }
        let max_size = options.max_size.unwrap_or(defaults::limits::MAX_FILE_SIZE);
        if data.len() > max_size {
            return Err(Error::file(format!(
                "file size {} exceeds limit {max_size}",
                data.len()
            ))
            .with_operation(OPERATION));
        }

        let content_type = mime_guess::from_path(&options.name)
            .first_or_octet_stream()
            .to_string();
        let mut fields = Vec::new();
        if let Some(purpose) = &options.purpose {
            fields.push(("purpose".to_string(), purpose.clone()));
        }
        let request = MultipartRequest {
            path: FILES_PATH.to_string(),
            file_name: options.name.clone(),
            content_type,
            data,
            fields,
        };

        let response = self
            .transport
            .execute_multipart(request)
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Reads a file from disk and uploads it.
    ///
    /// When the options carry no name, the on-disk file name is used.
    pub async fn upload_path(
        &self,
        path: impl AsRef<Path>,
        mut options: UploadOptions,
    ) -> Result<File> {
        const OPERATION: &str = "upload file";
        let path = path.as_ref();
        if options.name.is_empty()
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            options.name = name.to_string();
        }

        // Size-check from metadata so an oversized file is never buffered.
        let max_size = options.max_size.unwrap_or(defaults::limits::MAX_FILE_SIZE);
        let meta = tokio::fs::metadata(path).await.map_err(|e| {
            Error::file(format!("failed to stat {}: {e}", path.display()))
                .with_operation(OPERATION)
        })?;
        if meta.len() > max_size as u64 {
            return Err(Error::file(format!(
                "file size {} exceeds limit {max_size}",
                meta.len()
            ))
            .with_operation(OPERATION));
        }

        let data = tokio::fs::read(path).await.map_err(|e| {
            Error::file(format!("failed to read {}: {e}", path.display()))
                .with_operation(OPERATION)
        })?;
        self.upload(data, &options).await
    }

    /// Lists stored files.
    pub async fn list(&self, options: &ListOptions) -> Result<FileList> {
        const OPERATION: &str = "list files";
        let mut request = TransportRequest::get(FILES_PATH);
        request.query = options.to_query();
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Fetches one file's metadata.
    pub async fn get(&self, file_id: &str) -> Result<File> {
        const OPERATION: &str = "get file";
        let response = self
            .execute_for_id(file_id, "", OPERATION)
            .await?;
        response.decode().map_err(|e| e.with_operation(OPERATION))
    }

    /// Downloads a file's content.
    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        const OPERATION: &str = "download file";
        let response = self
            .execute_for_id(file_id, "/content", OPERATION)
            .await?;
        let content: FileContent =
            response.decode().map_err(|e| e.with_operation(OPERATION))?;
        BASE64.decode(&content.data).map_err(|e| {
            Error::parsing(format!("file payload is not valid base64: {e}"))
                .with_operation(OPERATION)
        })
    }

    /// Fetches a short-lived download URL for a file.
    pub async fn get_url(&self, file_id: &str) -> Result<String> {
        const OPERATION: &str = "get file url";
        let response = self.execute_for_id(file_id, "/url", OPERATION).await?;
        let url: FileUrl = response.decode().map_err(|e| e.with_operation(OPERATION))?;
        Ok(url.url)
    }

    /// Deletes a file.
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        const OPERATION: &str = "delete file";
        if file_id.is_empty() {
            return Err(Error::validation("file id is required").with_operation(OPERATION));
        }
        let path = format!("{FILES_PATH}/{}", urlencoding::encode(file_id));
        self.transport
            .execute(TransportRequest::delete(path))
            .await
            .map_err(|e| e.with_operation(OPERATION))?;
        Ok(())
    }

    /// Uploads several payloads concurrently, at most `concurrency` at a
    /// time (0 picks the default of 50).
    ///
    /// Upload failures do not abort the batch; every payload gets a result
    /// at its input index. The error return covers invalid arguments only.
    pub async fn batch_upload(
        &self,
        payloads: Vec<Vec<u8>>,
        options: Vec<UploadOptions>,
        concurrency: usize,
    ) -> Result<Vec<BatchUploadResult>> {
        const OPERATION: &str = "batch upload files";
        if payloads.is_empty() {
            return Err(
                Error::validation("at least one payload is required").with_operation(OPERATION)
            );
        }
        if options.len() != payloads.len() {
            return Err(Error::validation(format!(
                "options length ({}) must match payloads length ({})",
                options.len(),
                payloads.len()
            ))
            .with_operation(OPERATION));
        }
        let limit = if concurrency == 0 {
            DEFAULT_BATCH_CONCURRENCY
        } else {
            concurrency
        };

        let semaphore = Arc::new(Semaphore::new(limit));
        let mut handles = Vec::with_capacity(payloads.len());
        for (index, (data, options)) in payloads.into_iter().zip(options).enumerate() {
            let client = self.clone();
            let semaphore = semaphore.clone();
            handles.push((
                index,
                tokio::spawn(async move {
                    match semaphore.acquire_owned().await {
                        Ok(_permit) => match client.upload(data, &options).await {
                            Ok(file) => BatchUploadResult {
                                index,
                                file: Some(file),
                                error: None,
                            },
                            Err(error) => BatchUploadResult {
                                index,
                                file: None,
                                error: Some(error),
                            },
                        },
                        Err(_) => BatchUploadResult {
                            index,
                            file: None,
                            error: Some(Error::canceled("upload batch was closed")),
                        },
                    }
                }),
            ));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (index, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => BatchUploadResult {
                    index,
                    file: None,
                    error: Some(Error::internal(format!("upload task failed: {e}"))),
                },
            };
            results.push(result);
        }
        Ok(results)
    }

    /// GETs `/files/{id}{suffix}` after checking the id is present.
    async fn execute_for_id(
        &self,
        file_id: &str,
        suffix: &str,
        operation: &str,
    ) -> Result<TransportResponse> {
        if file_id.is_empty() {
            return Err(Error::validation("file id is required").with_operation(operation));
        }
        let path = format!("{FILES_PATH}/{}{suffix}", urlencoding::encode(file_id));
        self.transport
            .execute(TransportRequest::get(path))
            .await
            .map_err(|e| e.with_operation(operation))
    }
}
