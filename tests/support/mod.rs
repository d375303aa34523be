//! Shared fixtures for the wire-level tests.

#![allow(dead_code)]

use wiremock::MockServer;
use xai_sdk::{Client, Config};

/// Base configuration pointed at the mock server, with retries off so every
/// request hits the wire exactly once.
pub fn config_for(server: &MockServer) -> Config {
    Config::new("test-key")
        .with_host(server.address().ip().to_string())
        .with_port(server.address().port())
        .with_insecure(true)
        .with_max_retries(0)
}

/// A ready-made client for the mock server.
pub fn client_for(server: &MockServer) -> Client {
    Client::from_config(config_for(server)).expect("valid test configuration")
}
