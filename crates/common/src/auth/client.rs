//! HTTP client for the credential refresh endpoint
//!
//! Sends `POST {base}/login/refresh_token?type=<tag>` with the refresh token
//! in the body and maps the status onto [`RefreshResponse`]:
//! - `201` new tokens issued
//! - `203` refresh token no longer valid
//! - anything else rejected
//!
//! The call is never retried and never goes through the expired-token
//! replay path of the regular API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::traits::RefreshClientTrait;
use super::types::{RefreshResponse, RefreshTokenRequest, TokenResponse};

/// Path of the refresh endpoint relative to the API base URL
pub const REFRESH_TOKEN_PATH: &str = "login/refresh_token";

/// Error type for refresh client operations
#[derive(Debug, thiserror::Error)]
pub enum RefreshClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// 201 response whose body is not a token pair
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Settings for [`RefreshClient`]
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// API backend base URL
    pub base_url: String,
    /// Value of the `type` query parameter
    pub backend_tag: String,
    pub timeout: Duration,
}

impl RefreshConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, backend_tag: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            backend_tag: backend_tag.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Full URL of the refresh endpoint, without the query string.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), REFRESH_TOKEN_PATH)
    }
}

/// Refresh endpoint client
#[derive(Debug, Clone)]
pub struct RefreshClient {
    client: Client,
    endpoint: String,
    backend_tag: String,
}

impl RefreshClient {
    /// Build a client with its own connection pool.
    ///
    /// # Errors
    /// Returns error if the base URL is empty or the HTTP client cannot be
    /// built.
    pub fn new(config: RefreshConfig) -> Result<Self, RefreshClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RefreshClientError::ConfigError(e.to_string()))?;
        Self::with_client(client, config)
    }

    /// Build a client on top of an existing `reqwest::Client`.
    ///
    /// # Errors
    /// Returns error if the base URL is empty.
    pub fn with_client(client: Client, config: RefreshConfig) -> Result<Self, RefreshClientError> {
        if config.base_url.trim().is_empty() {
            return Err(RefreshClientError::ConfigError("API base URL is empty".to_string()));
        }
        Ok(Self { endpoint: config.endpoint(), backend_tag: config.backend_tag, client })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RefreshClientTrait for RefreshClient {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
        access_token: Option<&str>,
    ) -> Result<RefreshResponse, RefreshClientError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .query(&[("type", self.backend_tag.as_str())])
            .json(&RefreshTokenRequest { refresh_token });
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        debug!(endpoint = %self.endpoint, "sending refresh request");
        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::CREATED => {
                let body = response.text().await?;
                let tokens: TokenResponse = serde_json::from_str(&body)
                    .map_err(|e| RefreshClientError::ParseError(e.to_string()))?;
                Ok(RefreshResponse::Issued(tokens))
            }
            StatusCode::NON_AUTHORITATIVE_INFORMATION => Ok(RefreshResponse::Invalid),
            other => {
                let body = response.text().await.unwrap_or_default();
                warn!(status = other.as_u16(), "refresh endpoint rejected request");
                Ok(RefreshResponse::Rejected { status: other.as_u16(), body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client_for(server: &MockServer) -> RefreshClient {
        RefreshClient::new(RefreshConfig::new(server.uri(), "imax")).unwrap()
    }

    #[tokio::test]
    async fn created_response_yields_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/refresh_token"))
            .and(query_param("type", "imax"))
            .and(body_json(json!({ "refresh_token": "r1" })))
            .and(header("authorization", "Bearer a1"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({ "access_token": "a2", "refresh_token": "r2" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).await.refresh_access_token("r1", Some("a1")).await.unwrap();
        assert_eq!(response, RefreshResponse::Issued(TokenResponse::new("a2", "r2")));
    }

    #[tokio::test]
    async fn non_authoritative_response_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/refresh_token"))
            .respond_with(ResponseTemplate::new(203))
            .mount(&server)
            .await;

        let response = client_for(&server).await.refresh_access_token("r1", None).await.unwrap();
        assert_eq!(response, RefreshResponse::Invalid);
    }

    #[tokio::test]
    async fn other_status_is_rejected_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/refresh_token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let response = client_for(&server).await.refresh_access_token("r1", None).await.unwrap();
        assert_eq!(response, RefreshResponse::Rejected { status: 500, body: "boom".to_string() });
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = RefreshConfig::new("https://api.example.com/", "imax");
        assert_eq!(config.endpoint(), "https://api.example.com/login/refresh_token");
        assert!(RefreshClient::new(RefreshConfig::new("  ", "imax")).is_err());
    }
}
