//! Credential types and refresh wire formats

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access/refresh token pair held in the local store.
///
/// Tokens are opaque; expiry is only ever learned from a server rejection.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Bearer token attached to every outbound request
    pub access_token: String,

    /// Token exchanged for a new access token when the current one expires
    pub refresh_token: Option<String>,
}

impl Credential {
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Body of a successful refresh (and of login).
///
/// Either field may be missing; only the fields present are persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: Some(access_token.into()), refresh_token: Some(refresh_token.into()) }
    }
}

/// Body of `POST login/refresh_token`
#[derive(Debug, Serialize)]
pub struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

/// Raw answer of the refresh endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshResponse {
    /// 201: new tokens issued
    Issued(TokenResponse),
    /// 203: the refresh token itself is no longer valid
    Invalid,
    /// Any other status
    Rejected { status: u16, body: String },
}

/// Result of a refresh attempt as seen by request callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A usable credential is in the store (fresh or rotated by a peer)
    Refreshed(Credential),
    /// The refresh token was rejected; the user has to log in again
    Invalid,
    /// No refresh token is stored
    MissingRefreshToken,
    /// Transport, storage or unexpected-status failure
    Failed(String),
}
