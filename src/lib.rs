//! # xai-sdk - Rust client for the xAI API
//!
//! A typed async client covering the full REST surface: chat completions,
//! embeddings, image generation, file storage, document collections and
//! search, tokenization, API key introspection, and the model catalog.
//!
//! ## Features
//!
//! - **Chat**: synchronous, streaming (SSE), deferred, and structured
//!   completions with tool calling and live search.
//! - **Fluent Builders**: every request type is a consuming builder that
//!   validates before anything touches the network.
//! - **Shared Connection Pool**: one client, ten services; clones and
//!   service handles reuse the same pool.
//! - **Retries**: transparent exponential backoff with jitter on retryable
//!   failures only.
//! - **Safe Secrets**: API keys never appear in logs, `Debug` output, or
//!   error messages.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xai_sdk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads XAI_API_KEY from the environment.
//!     let client = Client::from_env()?;
//!
//!     let request = ChatRequest::new("grok-3")
//!         .with_message(Message::system("You are a concise assistant."))
//!         .with_message(Message::user("Why is the sky blue?"));
//!     let response = client.chat().sample(&request).await?;
//!     println!("{}", response.content());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! use xai_sdk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::from_env()?;
//!     let request = ChatRequest::new("grok-3")
//!         .with_message(Message::user("Tell me a story."));
//!
//!     let mut stream = client.chat().stream(&request).await?;
//!     while stream.next().await {
//!         if let Some(chunk) = stream.current() {
//!             print!("{}", chunk.content());
//!         }
//!     }
//!     if let Some(err) = stream.err() {
//!         eprintln!("stream failed: {err}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod auth;
pub mod chat;
pub mod client;
pub mod collections;
pub mod config;
pub mod defaults;
pub mod documents;
pub mod embed;
pub mod error;
pub mod files;
pub mod image;
pub mod listing;
pub mod metadata;
pub mod models;
pub mod retry;
pub mod sample;
pub mod tokenizer;
pub mod transport;

pub use client::Client;
pub use config::Config;
pub use error::{Error, ErrorKind, Result};

/// One-stop imports for typical SDK usage.
///
/// ```rust,no_run
/// use xai_sdk::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::Client;
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorKind, Result};

    pub use crate::chat::{
        ChatRequest, ChatResponse, ChatStream, Message, ResponseFormat, SearchParameters, Tool,
        ToolChoice,
    };
    pub use crate::collections::{Collection, CollectionOptions, Document, DocumentOptions};
    pub use crate::documents::{SearchRequest, SearchResponse};
    pub use crate::embed::{EmbedInput, EmbedRequest, EmbedResponse};
    pub use crate::files::{File, UploadOptions};
    pub use crate::image::{GenerateRequest, ImageResponse};
    pub use crate::listing::{ListOptions, SortOrder};
    pub use crate::sample::{SampleRequest, SampleResponse};
    pub use crate::tokenizer::{TokenizeRequest, TokenizeResponse};
}
