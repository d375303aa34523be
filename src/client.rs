//! The top-level API client.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthClient;
use crate::chat::ChatClient;
use crate::collections::CollectionsClient;
use crate::config::Config;
use crate::documents::DocumentsClient;
use crate::embed::EmbedClient;
use crate::error::Result;
use crate::files::FilesClient;
use crate::image::ImageClient;
use crate::models::ModelsClient;
use crate::sample::SampleClient;
use crate::tokenizer::TokenizerClient;
use crate::transport::{HealthStatus, HttpTransport, RestTransport};

/// Client for the xAI API.
///
/// Cloning is cheap; clones share one connection pool. The `with_*` mutators
/// never touch the receiver: they return a fresh client with the change
/// applied, so a client handed to other tasks keeps its configuration.
///
/// ```no_run
/// use xai_sdk::Client;
/// use xai_sdk::chat::{ChatRequest, Message};
///
/// # async fn run() -> xai_sdk::Result<()> {
/// let client = Client::from_env()?;
/// let request = ChatRequest::new("grok-3")
///     .with_message(Message::user("Why is the sky blue?"));
/// let response = client.chat().sample(&request).await?;
/// println!("{}", response.content());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    config: Config,
    transport: Arc<RestTransport>,
}

impl Client {
    /// Creates a client with the given API key and default configuration.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(Config::new(api_key))
    }

    /// Creates a client from defaults plus `XAI_*` environment overrides.
    pub fn from_env() -> Result<Self> {
        Self::from_config(Config::from_env())
    }

    /// Creates a client from an explicit configuration.
    ///
    /// Fails on invalid configuration (missing API key, backoff bounds out
    /// of order); no partial client is ever returned.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(RestTransport::new(config.clone())?);
        Ok(Self { config, transport })
    }

    /// Returns a copy of this client with a different per-request timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Result<Self> {
        Self::from_config(self.config.clone().with_timeout(timeout))
    }

    /// Returns a copy of this client authenticating with a different key.
    pub fn with_api_key(&self, api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(self.config.clone().with_api_key(api_key))
    }

    /// Returns a copy of this client that tags every request with a
    /// conversation id.
    pub fn with_conversation_id(&self, conversation_id: impl Into<String>) -> Result<Self> {
        let transport =
            RestTransport::new(self.config.clone())?.with_conversation_id(conversation_id);
        Ok(Self {
            config: self.config.clone(),
            transport: Arc::new(transport),
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Chat completions: sync, streaming, structured, and deferred.
    pub fn chat(&self) -> ChatClient {
        ChatClient::new(self.shared_transport())
    }

    /// Embeddings over text and image inputs.
    pub fn embed(&self) -> EmbedClient {
        EmbedClient::new(self.shared_transport())
    }

    /// Image generation.
    pub fn image(&self) -> ImageClient {
        ImageClient::new(self.shared_transport())
    }

    /// File storage.
    pub fn files(&self) -> FilesClient {
        FilesClient::new(self.shared_transport())
    }

    /// Document collections.
    pub fn collections(&self) -> CollectionsClient {
        CollectionsClient::new(self.shared_transport())
    }

    /// Semantic document search.
    pub fn documents(&self) -> DocumentsClient {
        DocumentsClient::new(self.shared_transport())
    }

    /// Server-side tokenization.
    pub fn tokenizer(&self) -> TokenizerClient {
        TokenizerClient::new(self.shared_transport())
    }

    /// API key introspection.
    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.shared_transport())
    }

    /// Model catalog.
    pub fn models(&self) -> ModelsClient {
        ModelsClient::new(self.shared_transport())
    }

    /// Legacy raw text completions.
    pub fn sample(&self) -> SampleClient {
        SampleClient::new(self.shared_transport())
    }

    /// Recreates the HTTP handle if the connection is in transient failure.
    pub async fn ensure_connection(&self) -> Result<()> {
        self.transport.ensure_connection().await
    }

    /// Reports connection health.
    pub async fn health(&self) -> HealthStatus {
        self.transport.health().await
    }

    /// Closes the client. Further calls fail with a canceled error; closing
    /// again is a no-op.
    pub async fn close(&self) -> Result<()> {
        self.transport.close().await
    }

    fn shared_transport(&self) -> Arc<dyn HttpTransport> {
        self.transport.clone()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
