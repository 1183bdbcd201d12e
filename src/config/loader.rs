//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Well-known GitLab variables (GITLAB_TOKEN, GITLAB_BASE_URL, ...)
//! 2. Environment variables (TANUKI_PROVIDER__*)
//! 3. Configuration file (TOML)
//! 4. Default values

use crate::config::types::ProviderConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "tanuki-provider.toml",
    ".tanuki-provider.toml",
    "~/.config/tanuki-provider/config.toml",
];

/// Token variables, checked in order of precedence
const TOKEN_ENV_VARS: &[(&str, &str)] = &[
    ("GITLAB_TOKEN", "private"),
    ("GITLAB_PRIVATE_TOKEN", "private"),
    ("CI_JOB_TOKEN", "job"),
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<ProviderConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let provider_config: ProviderConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&provider_config, false)?;

    Ok(provider_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<ProviderConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // First existing default path wins
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // e.g. TANUKI_PROVIDER__GITLAB__URL, TANUKI_PROVIDER__LOGGING__LEVEL
    builder = builder.add_source(
        Environment::with_prefix("TANUKI_PROVIDER")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let explicit_token = std::env::var("TANUKI_PROVIDER__GITLAB__TOKEN").is_ok();
    if !explicit_token {
        for (env_var, kind) in TOKEN_ENV_VARS {
            if let Ok(token) = std::env::var(env_var)
                && !token.is_empty()
            {
                builder = builder
                    .set_override("gitlab.token", token)
                    .and_then(|b| b.set_override("gitlab.token_kind", *kind))
                    .map_err(|e| ConfigError::Load(e.to_string()))?;
                break;
            }
        }
    }

    if let Ok(url) = std::env::var("GITLAB_BASE_URL") {
        builder = builder
            .set_override("gitlab.url", url)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let provider_config: ProviderConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&provider_config, true)?;

    Ok(provider_config)
}

/// Validate configuration values
fn validate_config(config: &ProviderConfig, require_token: bool) -> Result<(), ConfigError> {
    if config.gitlab.url.is_empty() {
        return Err(ConfigError::Missing {
            field: "gitlab.url".to_string(),
        });
    }

    if !config.gitlab.url.starts_with("http://") && !config.gitlab.url.starts_with("https://") {
        return Err(ConfigError::Invalid {
            message: format!(
                "gitlab.url must start with http:// or https://, got: {}",
                config.gitlab.url
            ),
        });
    }

    if require_token && config.gitlab.token.is_none() {
        return Err(ConfigError::Missing {
            field: "gitlab.token (set GITLAB_TOKEN environment variable)".to_string(),
        });
    }

    if config.gitlab.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "gitlab.timeout_secs must be greater than 0".to_string(),
        });
    }

    if let Some(path) = &config.gitlab.cacert_file {
        let expanded = shellexpand::tilde(path);
        if !Path::new(expanded.as_ref()).exists() {
            return Err(ConfigError::Invalid {
                message: format!("gitlab.cacert_file does not exist: {}", path),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogFormat, TokenKind};

    #[test]
    fn test_load_config_from_str_basic() {
        let toml = r#"
[gitlab]
url = "https://gitlab.example.com"
token = "test-token"
max_retries = 1

[logging]
level = "debug"
format = "json"
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.gitlab.url, "https://gitlab.example.com");
        assert_eq!(
            config.gitlab.token.as_ref().map(|t| t.expose_secret()),
            Some("test-token")
        );
        assert_eq!(config.gitlab.max_retries, 1);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_token_not_required_from_str() {
        let config = load_config_from_str("[gitlab]\nurl = \"https://gitlab.com\"\n").unwrap();
        assert!(config.gitlab.token.is_none());
        assert_eq!(config.gitlab.token_kind, TokenKind::Private);
    }

    #[test]
    fn test_token_required_by_full_validation() {
        let result = validate_config(&ProviderConfig::default(), true);
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_invalid_url_error() {
        let toml = r#"
[gitlab]
url = "not-a-url"
token = "token"
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_empty_url_error() {
        let toml = r#"
[gitlab]
url = ""
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_zero_timeout_error() {
        let toml = r#"
[gitlab]
timeout_secs = 0
"#;

        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn test_missing_cacert_file() {
        let toml = r#"
[gitlab]
cacert_file = "/definitely/not/here.pem"
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
