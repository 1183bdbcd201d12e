//! Error types for tanuki-provider
//!
//! This module defines the error hierarchy used throughout the crate.
//! Library code returns `thiserror` enums; the binary wraps them in `anyhow`
//! at the outermost layer.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("GitLab API error: {0}")]
    GitLab(#[from] GitLabError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// GitLab API specific errors
#[derive(Error, Debug)]
pub enum GitLabError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitLab API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("Resource not found: {message}")]
    NotFound { message: String },

    #[error("Unauthorized: invalid or expired token")]
    Unauthorized,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Invalid response from GitLab: {0}")]
    InvalidResponse(String),
}

impl GitLabError {
    /// Create an appropriate error from an HTTP status code and response body
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| format!("HTTP {}", status));
        match status {
            401 => GitLabError::Unauthorized,
            403 => GitLabError::Forbidden { message },
            404 => GitLabError::NotFound { message },
            429 => GitLabError::RateLimited { retry_after: 60 },
            _ => GitLabError::Api { status, message },
        }
    }

    /// HTTP status code carried by this error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            GitLabError::Request(e) => e.status().map(|s| s.as_u16()),
            GitLabError::Api { status, .. } => Some(*status),
            GitLabError::RateLimited { .. } => Some(429),
            GitLabError::NotFound { .. } => Some(404),
            GitLabError::Unauthorized => Some(401),
            GitLabError::Forbidden { .. } => Some(403),
            GitLabError::InvalidResponse(_) => None,
        }
    }

    /// Whether the remote object does not exist
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether the request conflicted with existing remote state (HTTP 409)
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

/// Pull the human readable part out of a GitLab error body.
///
/// GitLab answers with `{"message": ...}` or `{"error": ...}`, where `message`
/// may itself be an object of field errors. Anything else is returned as-is.
fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => {
            let field = value.get("message").or_else(|| value.get("error"));
            match field {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
                None => Some(body.to_string()),
            }
        }
        Err(_) => Some(body.to_string()),
    }
}

/// Errors raised by resource handlers
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("one and only one of {first} or {second} must be set")]
    ConflictingArguments {
        first: &'static str,
        second: &'static str,
    },

    #[error("couldn't find a user matching: {0}")]
    UserNotFound(String),

    #[error("more than one user found matching: {0}")]
    AmbiguousUser(String),

    #[error("unexpected ID format ({id:?}): expected {expected}")]
    InvalidId { id: String, expected: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid configuration:\n{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("{context}: {source}")]
    Remote {
        context: &'static str,
        #[source]
        source: GitLabError,
    },

    #[error(transparent)]
    GitLab(#[from] GitLabError),

    #[error("{resource} {id} disappeared after it was written")]
    Vanished { resource: &'static str, id: String },

    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ResourceError {
    /// Wrap a remote failure with the operation it interrupted
    pub fn remote(context: &'static str, source: GitLabError) -> Self {
        ResourceError::Remote { context, source }
    }

    /// Create an id-format error
    pub fn invalid_id(id: impl Into<String>, expected: impl Into<String>) -> Self {
        ResourceError::InvalidId {
            id: id.into(),
            expected: expected.into(),
        }
    }

    /// Whether this error reports a missing remote object
    pub fn is_not_found(&self) -> bool {
        match self {
            ResourceError::GitLab(e) | ResourceError::Remote { source: e, .. } => e.is_not_found(),
            _ => false,
        }
    }
}

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No authentication configured")]
    NotConfigured,

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Authentication failed: {0}")]
    Failed(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for resource operations
pub type ResourceResult<T> = std::result::Result<T, ResourceError>;

/// Result type alias for GitLab API operations
pub type GitLabResult<T> = std::result::Result<T, GitLabError>;
