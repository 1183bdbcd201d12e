//! Authentication module
//!
//! Provides the credentials attached to every GitLab API request.

pub mod provider;
pub mod token;

pub use provider::{AuthHeader, AuthProvider, BoxedAuthProvider};
pub use token::TokenProvider;

use crate::config::GitLabConfig;
use crate::error::AuthError;

/// Create an auth provider from configuration
pub fn create_auth_provider(config: &GitLabConfig) -> Result<BoxedAuthProvider, AuthError> {
    let token = config.token.clone().ok_or(AuthError::NotConfigured)?;
    Ok(Box::new(TokenProvider::new(token, config.token_kind)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenKind;
    use crate::util::SecretString;

    #[test]
    fn test_missing_token() {
        let config = GitLabConfig::default();
        assert!(matches!(
            create_auth_provider(&config),
            Err(AuthError::NotConfigured)
        ));
    }

    #[test]
    fn test_provider_follows_token_kind() {
        let config = GitLabConfig {
            token: Some(SecretString::new("ci")),
            token_kind: TokenKind::Job,
            ..Default::default()
        };
        let provider = create_auth_provider(&config).unwrap();
        assert_eq!(provider.auth_type(), "CI Job Token");
    }
}
