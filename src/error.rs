//! Error handling for the xAI SDK.
//!
//! Every fallible operation in this crate returns [`Error`]. An error is a
//! classified value: a fixed [`ErrorKind`], the originating HTTP status when
//! one exists, a human-readable message, an optional wrapped cause, and a
//! context map for diagnostics. Classification is total: any status code or
//! transport failure maps to exactly one kind, so callers can match on
//! [`Error::kind`] without a fallback arm.

use std::collections::HashMap;
use std::fmt;

/// Classification of SDK errors.
///
/// The set is closed: new failure modes must be folded into one of these
/// kinds rather than growing the enum, so downstream matches stay total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid client configuration (bad timeouts, missing API key).
    Config,
    /// Authentication or permission failure.
    Auth,
    /// Generic API-level failure (not found, conflict, unclassified).
    Api,
    /// Connection-level failure before a response was received.
    Network,
    /// Request rejected by client-side or server-side validation.
    Validation,
    /// Rate limit exceeded.
    RateLimit,
    /// Account quota exhausted.
    Quota,
    /// Server-side internal error.
    Internal,
    /// Service temporarily unavailable.
    Service,
    /// Deadline exceeded, either locally or at a gateway.
    Timeout,
    /// Call cancelled before completion.
    Canceled,
    /// Streaming transport failure mid-stream.
    Stream,
    /// Response body could not be decoded.
    Parsing,
    /// Local file handling failure (too large, unreadable).
    File,
}

impl ErrorKind {
    /// Wire-stable lowercase name, used in `Display` and logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Auth => "auth",
            Self::Api => "api",
            Self::Network => "network",
            Self::Validation => "validation",
            Self::RateLimit => "rate_limit",
            Self::Quota => "quota",
            Self::Internal => "internal",
            Self::Service => "service",
            Self::Timeout => "timeout",
            Self::Canceled => "canceled",
            Self::Stream => "stream",
            Self::Parsing => "parsing",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The SDK error type.
///
/// Displays as `[kind] message`, followed by the wrapped cause and the
/// context map when present.
#[derive(Debug, thiserror::Error)]
#[error("{}", render(.kind, .message, .source, .context))]
pub struct Error {
    kind: ErrorKind,
    status: Option<u16>,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    context: HashMap<String, String>,
}

fn render(
    kind: &ErrorKind,
    message: &str,
    source: &Option<Box<dyn std::error::Error + Send + Sync>>,
    context: &HashMap<String, String>,
) -> String {
    let mut out = format!("[{kind}] {message}");
    if let Some(cause) = source {
        out.push_str(&format!(" cause: {cause}"));
    }
    if !context.is_empty() {
        let mut pairs: Vec<String> = context.iter().map(|(k, v)| format!("{k}={v}")).collect();
        pairs.sort();
        out.push_str(&format!(" context: {{{}}}", pairs.join(", ")));
    }
    out
}

impl Error {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            source: None,
            context: HashMap::new(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message)
    }

    pub fn quota(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Quota, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Service, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Canceled, message)
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Stream, message)
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parsing, message)
    }

    pub fn file(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::File, message)
    }

    /// Attaches the originating HTTP status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Wraps a lower-level cause.
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Adds a diagnostic key/value pair.
    ///
    /// Values for secret-bearing keys (api key, authorization, token) are
    /// redacted before insertion; only the last four characters survive.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        let value = if is_secret_key(&key) { redact(&value) } else { value };
        self.context.insert(key, value);
        self
    }

    /// Prefixes the message with the name of the failed operation, so
    /// callers can tell which call failed without a backtrace.
    pub fn with_operation(mut self, operation: &str) -> Self {
        self.message = format!("{operation}: {}", self.message);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The originating HTTP status code, when the error came off the wire.
    pub fn status_code(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &HashMap<String, String> {
        &self.context
    }

    /// Whether a retry may succeed.
    ///
    /// The allow-list is fixed: service unavailability, timeouts, rate and
    /// quota exhaustion, and server-internal failures. Everything else
    /// (auth, validation, parsing, ...) will fail identically on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Service
                | ErrorKind::Timeout
                | ErrorKind::RateLimit
                | ErrorKind::Quota
                | ErrorKind::Internal
        )
    }

    /// Classifies an HTTP status code into an SDK error.
    ///
    /// The mapping is total: unknown codes land on the generic
    /// [`ErrorKind::Api`].
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            400 | 412 | 422 => ErrorKind::Validation,
            401 | 403 => ErrorKind::Auth,
            404 | 405 | 409 | 501 => ErrorKind::Api,
            408 | 504 => ErrorKind::Timeout,
            413 => ErrorKind::File,
            429 => ErrorKind::RateLimit,
            499 => ErrorKind::Canceled,
            500 => ErrorKind::Internal,
            502 | 503 => ErrorKind::Service,
            _ => ErrorKind::Api,
        };
        Self::new(kind, message).with_status(status)
    }
}

fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("key") || key.contains("token") || key.contains("secret") || key.contains("authorization")
}

/// Masks a secret, keeping only the last four characters.
pub(crate) fn redact(value: &str) -> String {
    if value.len() <= 4 {
        return "*".repeat(value.len());
    }
    let visible = &value[value.len() - 4..];
    format!("{}{visible}", "*".repeat(value.len() - 4))
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let err = match err.status() {
            Some(status) => return Self::from_status(status.as_u16(), err.to_string()),
            None => err,
        };
        if err.is_timeout() {
            Self::timeout(err.to_string()).with_source(err)
        } else if err.is_connect() {
            Self::network(err.to_string()).with_source(err)
        } else if err.is_body() || err.is_decode() {
            Self::parsing(err.to_string()).with_source(err)
        } else {
            Self::network(err.to_string()).with_source(err)
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::parsing(err.to_string()).with_source(err)
    }
}

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
