//! Redacting wrapper for tokens.

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// A token that never shows up in `Debug` or `Display` output.
///
/// The configuration keeps the GitLab token in this type so that dumping the
/// config at `debug` level cannot leak it. Call [`SecretString::expose_secret`]
/// where the raw value is really needed (building request headers).
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(Arc<str>);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    /// Explicitly expose the secret value.
    #[inline]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_redacted() {
        let secret = SecretString::new("glpat-secret");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_expose_secret() {
        let secret = SecretString::from("glpat-secret");
        assert_eq!(secret.expose_secret(), "glpat-secret");
        assert!(!secret.is_empty());
    }

    #[test]
    fn test_deserialize() {
        let secret: SecretString = serde_json::from_str(r#""test-token""#).unwrap();
        assert_eq!(secret.expose_secret(), "test-token");
    }

    #[test]
    fn test_redacted_inside_config_debug() {
        let config = crate::config::GitLabConfig {
            token: Some(SecretString::new("glpat-secret")),
            ..Default::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("glpat-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
