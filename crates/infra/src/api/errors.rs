//! API-specific error types
//!
//! Provides the failure taxonomy of the authenticated client. Only
//! `TokenExpired` and `RefreshInvalid` are ever recovered locally; every
//! other variant reaches the caller unchanged.

use std::fmt;
use std::time::Duration;

use modelhub_common::auth::RefreshClientError;
use modelhub_common::error::{ErrorClassification, ErrorSeverity};
use modelhub_common::storage::StorageError;
use thiserror::Error;
use tracing::{error, info, warn};

/// Taxonomy labels used in log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 401 - surfaced, never retried
    Unauthorized,
    /// 403 with the expired-token marker - recovered once by refresh
    TokenExpired,
    /// 203 from the refresh endpoint - recovered by redirect
    RefreshInvalid,
    /// Refresh transport or unexpected status
    RefreshFailed,
    /// Any other 4xx/5xx
    Status,
    Network,
    Timeout,
    Decode,
    Config,
    Storage,
}

impl ApiErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::TokenExpired => "token_expired",
            Self::RefreshInvalid => "refresh_invalid",
            Self::RefreshFailed => "refresh_failed",
            Self::Status => "status",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Decode => "decode",
            Self::Config => "config",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API operation errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Unauthorized: {url} returned 401")]
    Unauthorized { url: String, body: String },

    #[error("Access token expired: {url}")]
    TokenExpired { url: String },

    #[error("Refresh token rejected")]
    RefreshInvalid,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("{url} returned status {status}")]
    Status { status: u16, url: String, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Get the taxonomy label for this error
    pub const fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Unauthorized { .. } => ApiErrorKind::Unauthorized,
            Self::TokenExpired { .. } => ApiErrorKind::TokenExpired,
            Self::RefreshInvalid => ApiErrorKind::RefreshInvalid,
            Self::RefreshFailed(_) => ApiErrorKind::RefreshFailed,
            Self::Status { .. } => ApiErrorKind::Status,
            Self::Network(_) => ApiErrorKind::Network,
            Self::Timeout(_) => ApiErrorKind::Timeout,
            Self::Decode(_) => ApiErrorKind::Decode,
            Self::Config(_) => ApiErrorKind::Config,
            Self::Storage(_) => ApiErrorKind::Storage,
        }
    }

    /// HTTP status carried by the error, if it came from a response
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::TokenExpired { .. } => Some(403),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body, if the server sent one
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { body, .. } | Self::Status { body, .. } if !body.is_empty() => {
                Some(body.as_str())
            }
            _ => None,
        }
    }
}

impl ErrorClassification for ApiError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TokenExpired { .. } | Self::RefreshInvalid => ErrorSeverity::Info,
            Self::Unauthorized { .. } | Self::Network(_) | Self::Timeout(_) => {
                ErrorSeverity::Warning
            }
            Self::RefreshFailed(_) | Self::Status { .. } | Self::Decode(_) | Self::Storage(_) => {
                ErrorSeverity::Error
            }
            Self::Config(_) => ErrorSeverity::Critical,
        }
    }
}

/// Log `err` at the tracing level matching its severity.
pub fn log_api_error(err: &ApiError, message: &str) {
    let kind = err.kind().as_str();
    match err.severity() {
        ErrorSeverity::Info => info!(kind, error = %err, "{message}"),
        ErrorSeverity::Warning => warn!(kind, error = %err, "{message}"),
        ErrorSeverity::Error | ErrorSeverity::Critical => {
            error!(kind, severity = %err.severity(), error = %err, "{message}")
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<RefreshClientError> for ApiError {
    fn from(err: RefreshClientError) -> Self {
        match err {
            RefreshClientError::ConfigError(message) => Self::Config(message),
            other => Self::RefreshFailed(other.to_string()),
        }
    }
}
