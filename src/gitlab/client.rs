//! GitLab API client
//!
//! Authenticated HTTP plumbing shared by every resource handler. Typed
//! endpoint wrappers live in [`crate::gitlab::api`].

use crate::auth::BoxedAuthProvider;
use crate::config::GitLabConfig;
use crate::error::{GitLabError, GitLabResult};
use reqwest::header::RETRY_AFTER;
use reqwest::{Certificate, Client, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// GitLab API client
pub struct GitLabClient {
    http: Client,
    base_url: String,
    auth: BoxedAuthProvider,
    max_retries: u32,
}

impl GitLabClient {
    /// Create a new GitLab client from configuration
    pub fn new(config: &GitLabConfig, auth: BoxedAuthProvider) -> GitLabResult<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .user_agent(format!("tanuki-provider/{}", env!("CARGO_PKG_VERSION")));

        if let Some(path) = &config.cacert_file {
            let expanded = shellexpand::tilde(path);
            let pem = std::fs::read(expanded.as_ref()).map_err(|e| {
                GitLabError::InvalidResponse(format!("Failed to read CA bundle {}: {}", path, e))
            })?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }

        let http = builder.build().map_err(GitLabError::Request)?;

        debug!(auth = auth.auth_type(), url = %config.api_url(), "Created GitLab client");

        Ok(Self {
            http,
            base_url: config.api_url(),
            auth,
            max_retries: config.max_retries,
        })
    }

    /// Build a URL for an API endpoint
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Add authentication to a request
    async fn authenticate(&self, request: RequestBuilder) -> GitLabResult<RequestBuilder> {
        let header = self
            .auth
            .get_auth_header()
            .await
            .map_err(|e| GitLabError::Api {
                status: 401,
                message: e.to_string(),
            })?;

        Ok(request.header(header.header_name(), header.header_value()))
    }

    /// Execute a request, retrying transient failures
    async fn execute(&self, request: RequestBuilder) -> GitLabResult<Response> {
        let mut attempt = 0;

        loop {
            let req = request
                .try_clone()
                .ok_or_else(|| GitLabError::InvalidResponse("Cannot clone request".to_string()))?;

            let result = match req.send().await {
                Ok(response) => self.handle_response(response).await,
                Err(e) => Err(GitLabError::Request(e)),
            };

            match result {
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    let delay = backoff(attempt, &e);
                    warn!(error = %e, attempt, delay_ms = delay.as_millis() as u64, "Retrying request");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    /// Turn non-success statuses into errors
    async fn handle_response(&self, response: Response) -> GitLabResult<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(60);
            return Err(GitLabError::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();
        Err(GitLabError::from_response(status.as_u16(), &body))
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> GitLabResult<T> {
        response
            .json()
            .await
            .map_err(|e| GitLabError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// Make a GET request
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> GitLabResult<T> {
        let request = self.http.get(self.url(endpoint));
        let request = self.authenticate(request).await?;

        let response = self.execute(request).await?;
        Self::parse(response).await
    }

    /// Make a POST request
    #[instrument(skip(self, body), fields(endpoint = %endpoint))]
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> GitLabResult<T> {
        let request = self.http.post(self.url(endpoint)).json(body);
        let request = self.authenticate(request).await?;

        let response = self.execute(request).await?;
        Self::parse(response).await
    }

    /// Make a PUT request
    #[instrument(skip(self, body), fields(endpoint = %endpoint))]
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> GitLabResult<T> {
        let request = self.http.put(self.url(endpoint)).json(body);
        let request = self.authenticate(request).await?;

        let response = self.execute(request).await?;
        Self::parse(response).await
    }

    /// Make a DELETE request, ignoring any response body
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn delete(&self, endpoint: &str) -> GitLabResult<()> {
        let request = self.http.delete(self.url(endpoint));
        let request = self.authenticate(request).await?;

        self.execute(request).await?;
        Ok(())
    }
}

/// Check if an error is retryable
fn is_retryable(error: &GitLabError) -> bool {
    match error {
        GitLabError::Request(e) => e.is_timeout() || e.is_connect(),
        GitLabError::RateLimited { .. } => true,
        GitLabError::Api { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Exponential backoff, capped by what the server asked for when rate limited
fn backoff(attempt: u32, error: &GitLabError) -> Duration {
    let exponential = Duration::from_millis(100 * 2u64.pow(attempt.saturating_sub(1)));
    match error {
        GitLabError::RateLimited { retry_after } => {
            exponential.max(Duration::from_secs((*retry_after).min(60)))
        }
        _ => exponential,
    }
}
