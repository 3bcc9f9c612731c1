//! Authenticated client policy
//!
//! Attaches the current access token to every outbound request and recovers
//! from an expired token by refreshing it and replaying the request once.
//!
//! | Response | Handling |
//! |----------|----------|
//! | 401 | `Unauthorized`, surfaced, never retried |
//! | 403 `{"detail":"access_token expired"}` | refresh, then replay once |
//! | refresh 203 | redirect to login, resolve as [`Reply::Redirected`] |
//! | refresh failure | original `TokenExpired` surfaced |
//! | other 4xx/5xx | `Status`, surfaced unchanged |

use std::sync::Arc;

use modelhub_common::auth::{CredentialManager, RefreshOutcome};
use modelhub_domain::constants::EXPIRED_TOKEN_MARKER;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use super::errors::{log_api_error, ApiError};
use crate::http::HttpClient;
use crate::navigation::Navigator;

/// Result of a request that may have ended in a re-login redirect.
///
/// A redirect is not an error: the user has been sent to sign in again and
/// the caller simply has nothing to show.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Reply<T> {
    Data(T),
    Redirected,
}

impl<T> Reply<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Self::Data(value) => Reply::Data(f(value)),
            Self::Redirected => Reply::Redirected,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Data(value) => Some(value),
            Self::Redirected => None,
        }
    }

    pub const fn is_redirected(&self) -> bool {
        matches!(self, Self::Redirected)
    }
}

/// Outbound request description, replayable as often as needed
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    /// `path` is split on `/`; use [`segment`](Self::segment) for values that
    /// may themselves contain reserved characters.
    pub fn new(method: Method, path: &str) -> Self {
        let segments =
            path.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect();
        Self { method, segments, query: Vec::new(), body: None }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one percent-encoded path segment.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    /// Returns `Decode` if `body` cannot be serialized.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("Failed to serialize body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// State shared by every backend client of one signed-in session
#[derive(Clone)]
pub struct Session {
    http: HttpClient,
    credentials: CredentialManager,
    navigator: Arc<dyn Navigator>,
    redirect_uri: String,
}

impl Session {
    pub fn new(
        http: HttpClient,
        credentials: CredentialManager,
        navigator: Arc<dyn Navigator>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self { http, credentials, navigator, redirect_uri: redirect_uri.into() }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn redirect_to_login(&self, reason: &str) {
        info!(reason, location = %self.redirect_uri, "redirecting to login");
        self.navigator.redirect(&self.redirect_uri);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("credentials", &self.credentials)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

/// Client for one backend base address
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    name: String,
    base_url: Url,
    session: Session,
}

impl AuthenticatedClient {
    /// Create a client for `base_url`
    ///
    /// # Arguments
    ///
    /// * `name` - Backend label used in logs (`api`, `data`, `job_scheduler:US_EAST`)
    /// * `base_url` - Absolute base address; paths are appended to it
    /// * `session` - Shared transport, credentials and redirect target
    ///
    /// # Errors
    ///
    /// Returns `Config` if `base_url` is not an absolute URL
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        session: Session,
    ) -> Result<Self, ApiError> {
        let name = name.into();
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL for {name}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!("{name} base URL cannot carry paths")));
        }
        Ok(Self { name, base_url, session })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Absolute URL for `request`
    ///
    /// # Errors
    ///
    /// Returns `Config` if the base URL cannot take path segments
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Config(format!("{} base URL cannot carry paths", self.name)))?
            .pop_if_empty()
            .extend(&request.segments);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    /// Send `request`, recovering once from an expired access token
    ///
    /// # Returns
    ///
    /// The successful response, or `Reply::Redirected` if the refresh token
    /// was rejected and the user was sent to log in again
    ///
    /// # Errors
    ///
    /// Returns every non-recoverable failure unchanged; see the module table
    #[instrument(skip(self, request), fields(backend = %self.name, method = %request.method, path = %request.path()))]
    pub async fn send(&self, request: &ApiRequest) -> Result<Reply<Response>, ApiError> {
        let url = self.url_for(request)?;
        let credentials = self.session.credentials();
        let mut retried = false;

        loop {
            let token = credentials.access_token()?;

            let err = match self.attempt(request, &url, token.as_deref()).await {
                Ok(response) => return Ok(Reply::Data(response)),
                Err(err) => err,
            };

            if retried || !matches!(err, ApiError::TokenExpired { .. }) {
                log_api_error(&err, "request failed");
                return Err(err);
            }

            match credentials.refresh(token.as_deref()).await {
                RefreshOutcome::Refreshed(_) => {
                    debug!("replaying request with refreshed token");
                    retried = true;
                }
                RefreshOutcome::Invalid => {
                    log_api_error(&ApiError::RefreshInvalid, "refresh token rejected");
                    self.session.redirect_to_login("refresh token rejected");
                    return Ok(Reply::Redirected);
                }
                RefreshOutcome::MissingRefreshToken => {
                    self.session.redirect_to_login("no refresh token stored");
                    return Err(err);
                }
                RefreshOutcome::Failed(reason) => {
                    log_api_error(
                        &ApiError::RefreshFailed(reason),
                        "token refresh failed; surfacing original error",
                    );
                    return Err(err);
                }
            }
        }
    }

    /// Send `request` and decode a JSON body.
    ///
    /// 204/205 and empty bodies decode as JSON `null`.
    ///
    /// # Errors
    ///
    /// Everything [`send`](Self::send) returns, plus `Decode`
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Reply<T>, ApiError> {
        match self.send(request).await? {
            Reply::Data(response) => decode_json(response).await.map(Reply::Data),
            Reply::Redirected => Ok(Reply::Redirected),
        }
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        url: &Url,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let http = self.session.http();
        let mut builder = http
            .request(request.method.clone(), url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = http.send(builder).await?;
        classify(response, url).await
    }
}

async fn classify(response: Response, url: &Url) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() || status.is_redirection() || status.is_informational() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let url = url.to_string();

    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized { url, body }),
        StatusCode::FORBIDDEN if is_expired_token(&body) => Err(ApiError::TokenExpired { url }),
        _ => Err(ApiError::Status { status: status.as_u16(), url, body }),
    }
}

fn is_expired_token(body: &str) -> bool {
    serde_json::from_str::<Value>(body).is_ok_and(|value| {
        value.get("detail").and_then(Value::as_str) == Some(EXPIRED_TOKEN_MARKER)
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Network(format!("Failed to read response body: {e}")))?;

    // 204 and 205 never carry a body
    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT || bytes.is_empty()
    {
        return serde_json::from_value(Value::Null).map_err(|_| {
            ApiError::Decode(format!(
                "empty response ({}) cannot be decoded into the expected type",
                status.as_u16()
            ))
        });
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Decode(format!("Failed to parse response: {e}")))
}
