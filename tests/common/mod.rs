//! Shared helpers for mock-server tests

#![allow(dead_code)]

use std::sync::Arc;
use tanuki_provider::auth::TokenProvider;
use tanuki_provider::config::GitLabConfig;
use tanuki_provider::gitlab::GitLabClient;
use tanuki_provider::resources::ResourceContext;
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";

/// Config pointing at the mock server, without retries
pub fn test_config(mock_server: &MockServer) -> GitLabConfig {
    GitLabConfig {
        url: mock_server.uri(),
        token: Some(TOKEN.into()),
        max_retries: 0,
        ..Default::default()
    }
}

pub fn test_client(mock_server: &MockServer) -> GitLabClient {
    let auth = TokenProvider::private(TOKEN).unwrap();
    GitLabClient::new(&test_config(mock_server), Box::new(auth)).unwrap()
}

pub fn test_context(mock_server: &MockServer) -> ResourceContext {
    ResourceContext::new(Arc::new(test_client(mock_server)))
}
