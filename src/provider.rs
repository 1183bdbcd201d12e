//! Provider
//!
//! Owns the GitLab client and the resource registry, and hands out the
//! context each resource operation runs with.

use crate::auth::create_auth_provider;
use crate::config::GitLabConfig;
use crate::error::{AuthError, Result};
use crate::gitlab::GitLabClient;
use crate::resources::{ResourceContext, ResourceRegistry};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Configured provider instance
pub struct Provider {
    gitlab: Arc<GitLabClient>,
    registry: ResourceRegistry,
    early_auth_check: bool,
}

impl Provider {
    /// Build a provider with all built-in resources registered
    pub fn new(config: &GitLabConfig) -> Result<Self> {
        Self::with_registry(config, ResourceRegistry::builtin())
    }

    /// Build a provider around an explicitly assembled registry
    pub fn with_registry(config: &GitLabConfig, registry: ResourceRegistry) -> Result<Self> {
        let auth = create_auth_provider(config)?;
        let gitlab = GitLabClient::new(config, auth)?;

        debug!(
            url = %config.api_url(),
            resources = registry.len(),
            "Provider created"
        );

        Ok(Self {
            gitlab: Arc::new(gitlab),
            registry,
            early_auth_check: config.early_auth_check,
        })
    }

    /// Finish configuration, verifying the token if requested
    #[instrument(skip(self))]
    pub async fn configure(&self) -> Result<()> {
        if !self.early_auth_check {
            debug!("Skipping early authentication check");
            return Ok(());
        }

        let user = self
            .gitlab
            .users()
            .current()
            .await
            .map_err(|e| AuthError::Failed(format!("GitLab rejected the token: {}", e)))?;

        info!(user = %user.username, "Authenticated with GitLab");
        Ok(())
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Context for one resource operation
    pub fn context(&self) -> ResourceContext {
        ResourceContext::new(self.gitlab.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_new_requires_token() {
        let config = GitLabConfig::default();
        assert!(matches!(
            Provider::new(&config),
            Err(AppError::Auth(AuthError::NotConfigured))
        ));
    }

    #[tokio::test]
    async fn test_configure_without_auth_check() {
        let config = GitLabConfig {
            token: Some("glpat-test".into()),
            early_auth_check: false,
            ..Default::default()
        };
        let provider = Provider::new(&config).unwrap();
        assert_eq!(provider.registry().len(), 3);
        provider.configure().await.unwrap();
    }
}
