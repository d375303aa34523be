//! Default Configuration Values
//!
//! This module centralizes all default values used throughout the SDK.
//! Having defaults in one place makes them easier to maintain, document,
//! and adjust. None of these values are mutable at runtime; overrides go
//! through [`crate::Config`].

use std::time::Duration;

/// SDK identity stamped into outgoing request headers.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default User-Agent string for HTTP requests.
pub const USER_AGENT: &str = concat!("xai-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Remote endpoint defaults
pub mod net {
    /// Default API host.
    pub const HOST: &str = "api.x.ai";

    /// Default HTTPS port.
    pub const PORT: u16 = 443;

    /// Path prefix for the current API version.
    pub const API_PREFIX: &str = "/v1";
}

/// Timeout defaults
pub mod timeouts {
    use super::*;

    /// Default per-request timeout.
    ///
    /// Thirty seconds accommodates large models that take several seconds
    /// to respond, plus network latency.
    pub const REQUEST: Duration = Duration::from_secs(30);

    /// Default timeout for establishing a connection.
    pub const CONNECT: Duration = Duration::from_secs(10);

    /// Default keep-alive for pooled idle connections.
    pub const KEEP_ALIVE: Duration = Duration::from_secs(20);

    /// Default timeout for a full streaming response.
    ///
    /// Streams stay open for the whole generation, so this is much larger
    /// than the unary request timeout.
    pub const STREAM: Duration = Duration::from_secs(300);
}

/// Retry defaults
pub mod retry {
    use super::*;

    /// Default maximum number of retry attempts.
    pub const MAX_RETRIES: u32 = 3;

    /// Default base backoff between retries.
    pub const BACKOFF: Duration = Duration::from_secs(1);

    /// Default upper bound on backoff growth.
    pub const MAX_BACKOFF: Duration = Duration::from_secs(60);
}

/// Deferred completion polling defaults
pub mod deferred {
    use super::*;

    /// Default interval between status polls.
    pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Default overall deadline for polling a deferred completion.
    pub const POLL_TIMEOUT: Duration = Duration::from_secs(600);
}

/// Payload size limits
pub mod limits {
    /// Default upload chunk size (3 MiB).
    pub const CHUNK_SIZE: usize = 3 * 1024 * 1024;

    /// Maximum upload chunk size (10 MiB).
    pub const MAX_CHUNK_SIZE: usize = 10 * 1024 * 1024;

    /// Default I/O buffer size (64 KiB).
    pub const BUFFER_SIZE: usize = 64 * 1024;

    /// Maximum accepted image payload (10 MiB).
    pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

    /// Maximum accepted file upload (100 MiB).
    pub const MAX_FILE_SIZE: usize = 100 * 1024 * 1024;

    /// Maximum response body the transport will buffer (100 MiB).
    pub const MAX_RESPONSE_SIZE: usize = 100 * 1024 * 1024;

    /// Default completion token cap when none is requested.
    pub const MAX_TOKENS: u32 = 4096;

    /// Maximum tokens accepted per chat request.
    pub const MAX_PROMPT_TOKENS: u32 = 8192;
}

/// Header names used by the service
pub mod headers {
    /// Raw API key header, used when bearer auth is disabled.
    pub const X_API_KEY: &str = "x-api-key";

    /// SDK name/version tag.
    pub const CLIENT_VERSION: &str = "x-client-version";

    /// Request correlation id.
    pub const REQUEST_ID: &str = "x-request-id";

    /// Deployment environment tag.
    pub const ENVIRONMENT: &str = "x-environment";

    /// Conversation correlation id.
    pub const CONVERSATION_ID: &str = "x-conversation-id";
}

/// Environment variable names recognized by [`crate::Config::from_env`]
pub mod env {
    pub const API_KEY: &str = "XAI_API_KEY";
    pub const HOST: &str = "XAI_HOST";
    pub const HTTP_HOST: &str = "XAI_HTTP_HOST";
    pub const HTTP_PORT: &str = "XAI_HTTP_PORT";
    pub const TIMEOUT: &str = "XAI_TIMEOUT";
    pub const CONNECT_TIMEOUT: &str = "XAI_CONNECT_TIMEOUT";
    pub const KEEPALIVE_TIMEOUT: &str = "XAI_KEEPALIVE_TIMEOUT";
    pub const STREAM_TIMEOUT: &str = "XAI_STREAM_TIMEOUT";
    pub const INSECURE: &str = "XAI_INSECURE";
    pub const SKIP_VERIFY: &str = "XAI_SKIP_VERIFY";
    pub const MAX_RETRIES: &str = "XAI_MAX_RETRIES";
    pub const RETRY_BACKOFF: &str = "XAI_RETRY_BACKOFF";
    pub const MAX_BACKOFF: &str = "XAI_MAX_BACKOFF";
    pub const ENVIRONMENT: &str = "XAI_ENVIRONMENT";
    pub const USER_AGENT: &str = "XAI_USER_AGENT";
    pub const ENABLE_TELEMETRY: &str = "XAI_ENABLE_TELEMETRY";
}
