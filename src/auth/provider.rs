//! Authentication provider trait

use crate::error::AuthError;
// async_trait required for dyn-compatibility with Box<dyn AuthProvider>
use async_trait::async_trait;

/// Supplies credentials for GitLab API requests.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Header to attach to every request
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError>;

    /// Description of the auth method (for logging)
    fn auth_type(&self) -> &'static str;
}

/// Authentication header to use with requests
#[derive(Debug, Clone)]
pub enum AuthHeader {
    /// OAuth access token
    Bearer(String),
    /// Personal, project or group access token
    PrivateToken(String),
    /// CI job token
    JobToken(String),
}

impl AuthHeader {
    /// Get the header name for this auth type
    pub fn header_name(&self) -> &'static str {
        match self {
            AuthHeader::Bearer(_) => "Authorization",
            AuthHeader::PrivateToken(_) => "PRIVATE-TOKEN",
            AuthHeader::JobToken(_) => "JOB-TOKEN",
        }
    }

    /// Get the header value for this auth type
    pub fn header_value(&self) -> String {
        match self {
            AuthHeader::Bearer(token) => format!("Bearer {}", token),
            AuthHeader::PrivateToken(token) | AuthHeader::JobToken(token) => token.clone(),
        }
    }
}

/// Box type alias for auth providers
pub type BoxedAuthProvider = Box<dyn AuthProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names() {
        assert_eq!(AuthHeader::Bearer("t".into()).header_name(), "Authorization");
        assert_eq!(
            AuthHeader::PrivateToken("t".into()).header_name(),
            "PRIVATE-TOKEN"
        );
        assert_eq!(AuthHeader::JobToken("t".into()).header_name(), "JOB-TOKEN");
    }

    #[test]
    fn test_header_values() {
        assert_eq!(AuthHeader::Bearer("abc".into()).header_value(), "Bearer abc");
        assert_eq!(AuthHeader::JobToken("abc".into()).header_value(), "abc");
    }
}
