//! Configuration types for tanuki-provider
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::util::SecretString;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// GitLab connection settings
    pub gitlab: GitLabConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// GitLab connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// GitLab instance URL (e.g., `https://gitlab.com`)
    pub url: String,

    /// Access token (prefer env var GITLAB_TOKEN)
    pub token: Option<SecretString>,

    /// How the token is presented to GitLab
    pub token_kind: TokenKind,

    /// API version (default: "v4")
    pub api_version: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries for failed requests
    pub max_retries: u32,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,

    /// Additional PEM encoded CA bundle to trust
    pub cacert_file: Option<String>,

    /// Verify the token against `/user` while configuring the provider
    pub early_auth_check: bool,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            url: "https://gitlab.com".to_string(),
            token: None,
            token_kind: TokenKind::Private,
            api_version: "v4".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            verify_ssl: true,
            cacert_file: None,
            early_auth_check: true,
        }
    }
}

impl GitLabConfig {
    /// Get the full API base URL
    ///
    /// Accepts both a bare instance URL and one that already ends in
    /// `/api/<version>`, which is how `GITLAB_BASE_URL` is usually written.
    pub fn api_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        let suffix = format!("/api/{}", self.api_version);
        if base.ends_with(&suffix) {
            base.to_string()
        } else {
            format!("{}{}", base, suffix)
        }
    }
}

/// Token flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Personal, project or group access token (`PRIVATE-TOKEN` header)
    #[default]
    Private,
    /// CI job token (`JOB-TOKEN` header)
    Job,
    /// OAuth access token (`Authorization: Bearer`)
    Oauth,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gitlab_config_api_url() {
        let config = GitLabConfig {
            url: "https://gitlab.example.com".to_string(),
            api_version: "v4".to_string(),
            ..Default::default()
        };
        assert_eq!(config.api_url(), "https://gitlab.example.com/api/v4");

        // Test with trailing slash
        let config = GitLabConfig {
            url: "https://gitlab.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.api_url(), "https://gitlab.example.com/api/v4");
    }

    #[test]
    fn test_api_url_already_qualified() {
        let config = GitLabConfig {
            url: "https://gitlab.example.com/api/v4/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.api_url(), "https://gitlab.example.com/api/v4");
    }

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.gitlab.url, "https://gitlab.com");
        assert_eq!(config.gitlab.timeout_secs, 30);
        assert_eq!(config.gitlab.token_kind, TokenKind::Private);
        assert!(config.gitlab.early_auth_check);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_deserialize_token_kind() {
        let kind: TokenKind = serde_json::from_str(r#""job""#).unwrap();
        assert_eq!(kind, TokenKind::Job);

        let kind: TokenKind = serde_json::from_str(r#""oauth""#).unwrap();
        assert_eq!(kind, TokenKind::Oauth);

        assert!(serde_json::from_str::<TokenKind>(r#""basic""#).is_err());
    }
}
