//! Static token authentication

use crate::auth::provider::{AuthHeader, AuthProvider};
use crate::config::TokenKind;
use crate::error::AuthError;
use crate::util::SecretString;
use async_trait::async_trait;

/// Authenticates every request with one long-lived token.
#[derive(Debug, Clone)]
pub struct TokenProvider {
    token: SecretString,
    kind: TokenKind,
}

impl TokenProvider {
    /// Create a new token provider
    pub fn new(token: impl Into<SecretString>, kind: TokenKind) -> Result<Self, AuthError> {
        let token = token.into();

        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(Self { token, kind })
    }

    /// Personal access token shorthand
    pub fn private(token: impl Into<SecretString>) -> Result<Self, AuthError> {
        Self::new(token, TokenKind::Private)
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }
}

#[async_trait]
impl AuthProvider for TokenProvider {
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError> {
        let token = self.token.expose_secret().to_string();
        Ok(match self.kind {
            TokenKind::Private => AuthHeader::PrivateToken(token),
            TokenKind::Job => AuthHeader::JobToken(token),
            TokenKind::Oauth => AuthHeader::Bearer(token),
        })
    }

    fn auth_type(&self) -> &'static str {
        match self.kind {
            TokenKind::Private => "Access Token",
            TokenKind::Job => "CI Job Token",
            TokenKind::Oauth => "OAuth Token",
        }
    }
}
