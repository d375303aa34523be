//! Client configuration.
//!
//! Configuration resolves in three layers with fixed precedence: explicit
//! setter calls override environment variables, which override the built-in
//! defaults from [`crate::defaults`]. [`Config::validate`] runs before any
//! client is constructed; an invalid configuration never produces a partial
//! client.

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::defaults;
use crate::error::{Error, Result, redact};

/// Client configuration for the xAI API.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key used to authenticate every request.
    pub api_key: SecretString,
    /// API host.
    pub host: String,
    /// Optional separate host for REST calls; falls back to `host`.
    pub http_host: Option<String>,
    /// API port.
    pub http_port: u16,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Keep-alive applied to pooled idle connections.
    pub keepalive_timeout: Duration,
    /// Timeout covering an entire streaming response.
    pub stream_timeout: Duration,
    /// Disables TLS entirely. Local development only.
    pub insecure: bool,
    /// Skips TLS certificate verification. Local development only.
    pub skip_verify: bool,
    /// Maximum retry attempts for retryable failures.
    pub max_retries: u32,
    /// Base backoff between retries.
    pub retry_backoff: Duration,
    /// Upper bound on backoff growth.
    pub max_backoff: Duration,
    /// Deployment environment tag sent with every request.
    pub environment: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Gates the SDK's request-level tracing events.
    pub enable_telemetry: bool,
    /// Sends the key raw in `x-api-key` instead of `authorization: Bearer`.
    pub use_x_api_key: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: SecretString::from(String::new()),
            host: defaults::net::HOST.to_string(),
            http_host: None,
            http_port: defaults::net::PORT,
            timeout: defaults::timeouts::REQUEST,
            connect_timeout: defaults::timeouts::CONNECT,
            keepalive_timeout: defaults::timeouts::KEEP_ALIVE,
            stream_timeout: defaults::timeouts::STREAM,
            insecure: false,
            skip_verify: false,
            max_retries: defaults::retry::MAX_RETRIES,
            retry_backoff: defaults::retry::BACKOFF,
            max_backoff: defaults::retry::MAX_BACKOFF,
            environment: "production".to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            enable_telemetry: false,
            use_x_api_key: false,
        }
    }
}

impl Config {
    /// Creates a configuration with the given API key and defaults for
    /// everything else. Does not consult the environment.
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            ..Default::default()
        }
    }

    /// Creates a configuration from defaults plus environment overrides.
    ///
    /// Unparsable environment values are skipped with a warning rather than
    /// failing; `validate()` still runs at client construction.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(defaults::env::API_KEY)
            && !key.is_empty()
        {
            self.api_key = SecretString::from(key);
        }
        if let Ok(host) = std::env::var(defaults::env::HOST)
            && !host.is_empty()
        {
            self.host = host;
        }
        if let Ok(host) = std::env::var(defaults::env::HTTP_HOST)
            && !host.is_empty()
        {
            self.http_host = Some(host);
        }
        if let Some(port) = env_parsed(defaults::env::HTTP_PORT, |v| v.parse::<u16>().ok()) {
            self.http_port = port;
        }
        if let Some(d) = env_duration(defaults::env::TIMEOUT) {
            self.timeout = d;
        }
        if let Some(d) = env_duration(defaults::env::CONNECT_TIMEOUT) {
            self.connect_timeout = d;
        }
        if let Some(d) = env_duration(defaults::env::KEEPALIVE_TIMEOUT) {
            self.keepalive_timeout = d;
        }
        if let Some(d) = env_duration(defaults::env::STREAM_TIMEOUT) {
            self.stream_timeout = d;
        }
        if let Some(v) = env_parsed(defaults::env::INSECURE, parse_bool) {
            self.insecure = v;
        }
        if let Some(v) = env_parsed(defaults::env::SKIP_VERIFY, parse_bool) {
            self.skip_verify = v;
        }
        if let Some(v) = env_parsed(defaults::env::MAX_RETRIES, |v| v.parse::<u32>().ok()) {
            self.max_retries = v;
        }
        if let Some(d) = env_duration(defaults::env::RETRY_BACKOFF) {
            self.retry_backoff = d;
        }
        if let Some(d) = env_duration(defaults::env::MAX_BACKOFF) {
            self.max_backoff = d;
        }
        if let Ok(env) = std::env::var(defaults::env::ENVIRONMENT)
            && !env.is_empty()
        {
            self.environment = env;
        }
        if let Ok(ua) = std::env::var(defaults::env::USER_AGENT)
            && !ua.is_empty()
        {
            self.user_agent = ua;
        }
        if let Some(v) = env_parsed(defaults::env::ENABLE_TELEMETRY, parse_bool) {
            self.enable_telemetry = v;
        }
    }

    /// Sets the API key.
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = SecretString::from(api_key.into());
        self
    }

    /// Sets the API host.
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self.http_host = None;
        self
    }

    /// Sets the API port.
    pub const fn with_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    /// Sets the per-request timeout.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the streaming timeout.
    pub const fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// Disables TLS. Local development only.
    pub const fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Skips TLS certificate verification. Local development only.
    pub const fn with_skip_verify(mut self, skip_verify: bool) -> Self {
        self.skip_verify = skip_verify;
        self
    }

    /// Sets the maximum retry attempts.
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base retry backoff.
    pub const fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Sets the backoff upper bound.
    pub const fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Sets the environment tag.
    pub fn with_environment<S: Into<String>>(mut self, environment: S) -> Self {
        self.environment = environment.into();
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Gates the SDK's request-level tracing events.
    pub const fn with_telemetry(mut self, enable: bool) -> Self {
        self.enable_telemetry = enable;
        self
    }

    /// Switches authentication to the raw `x-api-key` header.
    pub const fn with_x_api_key_auth(mut self, use_x_api_key: bool) -> Self {
        self.use_x_api_key = use_x_api_key;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.expose_secret().is_empty() {
            return Err(Error::config(
                "API key is required. Set XAI_API_KEY or call with_api_key().",
            ));
        }
        if self.host.is_empty() {
            return Err(Error::config("host cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be positive"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect_timeout must be positive"));
        }
        if self.keepalive_timeout.is_zero() {
            return Err(Error::config("keepalive_timeout must be positive"));
        }
        if self.stream_timeout.is_zero() {
            return Err(Error::config("stream_timeout must be positive"));
        }
        if self.retry_backoff.is_zero() {
            return Err(Error::config("retry_backoff must be positive"));
        }
        if self.max_backoff.is_zero() {
            return Err(Error::config("max_backoff must be positive"));
        }
        if self.max_backoff < self.retry_backoff {
            return Err(Error::config(
                "max_backoff must be greater than or equal to retry_backoff",
            ));
        }
        Ok(())
    }

    /// Host serving REST calls.
    pub fn effective_host(&self) -> &str {
        self.http_host.as_deref().unwrap_or(&self.host)
    }

    /// `host:port` form of the REST endpoint.
    pub fn address(&self) -> String {
        format!("{}:{}", self.effective_host(), self.http_port)
    }

    /// Base URL for all REST paths, including the API version prefix.
    pub fn base_url(&self) -> String {
        let scheme = if self.insecure { "http" } else { "https" };
        let default_port = if self.insecure { 80 } else { 443 };
        let prefix = defaults::net::API_PREFIX;
        if self.http_port == default_port {
            format!("{scheme}://{}{prefix}", self.effective_host())
        } else {
            format!("{scheme}://{}:{}{prefix}", self.effective_host(), self.http_port)
        }
    }

    /// Authorization header value for the configured scheme.
    pub fn auth_header_value(&self) -> String {
        if self.use_x_api_key {
            self.api_key.expose_secret().to_string()
        } else {
            format!("Bearer {}", self.api_key.expose_secret())
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config{{api_key:{}, host:{}, port:{}, insecure:{}, environment:{}, max_retries:{}}}",
            mask_key(self.api_key.expose_secret()),
            self.host,
            self.http_port,
            self.insecure,
            self.environment,
            self.max_retries,
        )
    }
}

/// Masks an API key for display, keeping the last eight characters.
fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    if key.len() > 8 {
        format!("{}{}", "*".repeat(key.len() - 8), &key[key.len() - 8..])
    } else {
        "*".repeat(key.len())
    }
}

fn env_parsed<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    if raw.is_empty() {
        return None;
    }
    match parse(&raw) {
        Some(v) => Some(v),
        None => {
            tracing::warn!(variable = name, value = %redact(&raw), "ignoring unparsable environment override");
            None
        }
    }
}

fn env_duration(name: &str) -> Option<Duration> {
    env_parsed(name, |raw| parse_duration(raw).ok())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

/// Parses a duration that is either a bare number of seconds ("30") or a
/// sequence of value/unit pairs ("30s", "1m30s", "500ms", "1.5h").
pub(crate) fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return Err(Error::config(format!("invalid duration: {input:?}")));
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        if number_len == 0 || number_len == rest.len() {
            return Err(Error::config(format!("invalid duration: {input:?}")));
        }
        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number
            .parse()
            .map_err(|_| Error::config(format!("invalid duration: {input:?}")))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let unit_seconds = match unit {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(Error::config(format!("invalid duration: {input:?}"))),
        };
        total += Duration::from_secs_f64(value * unit_seconds);
        rest = tail;
    }
    Ok(total)
}
