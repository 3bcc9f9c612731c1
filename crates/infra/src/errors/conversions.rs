//! Conversions from external infrastructure errors into domain errors.

use modelhub_common::auth::RefreshClientError;
use modelhub_common::storage::StorageError;
use modelhub_domain::ModelHubError;
use reqwest::Error as HttpError;

use crate::api::ApiError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ModelHubError);

impl From<InfraError> for ModelHubError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ModelHubError> for InfraError {
    fn from(value: ModelHubError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoModelHubError {
    fn into_modelhub(self) -> ModelHubError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ModelHubError */
/* -------------------------------------------------------------------------- */

impl IntoModelHubError for HttpError {
    fn into_modelhub(self) -> ModelHubError {
        if self.is_timeout() {
            return ModelHubError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return ModelHubError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return ModelHubError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => ModelHubError::Auth(message),
                404 => ModelHubError::NotFound(message),
                400..=499 => ModelHubError::InvalidInput(message),
                _ => ModelHubError::Network(message),
            };
        }

        ModelHubError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_modelhub())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError / RefreshClientError → ModelHubError */
/* -------------------------------------------------------------------------- */

impl IntoModelHubError for StorageError {
    fn into_modelhub(self) -> ModelHubError {
        ModelHubError::Storage(self.to_string())
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_modelhub())
    }
}

impl From<RefreshClientError> for InfraError {
    fn from(value: RefreshClientError) -> Self {
        match value {
            RefreshClientError::RequestFailed(err) => err.into(),
            RefreshClientError::ParseError(message) => InfraError(ModelHubError::Auth(message)),
            RefreshClientError::ConfigError(message) => InfraError(ModelHubError::Config(message)),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* ApiError → ModelHubError */
/* -------------------------------------------------------------------------- */

impl From<ApiError> for ModelHubError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err {
            ApiError::Unauthorized { .. }
            | ApiError::TokenExpired { .. }
            | ApiError::RefreshInvalid
            | ApiError::RefreshFailed(_) => Self::Auth(message),
            ApiError::Status { status: 404, .. } => Self::NotFound(message),
            ApiError::Status { status: 400..=499, .. } => Self::InvalidInput(message),
            ApiError::Status { .. } | ApiError::Network(_) | ApiError::Timeout(_) => {
                Self::Network(message)
            }
            ApiError::Decode(_) => Self::Internal(message),
            ApiError::Config(_) => Self::Config(message),
            ApiError::Storage(_) => Self::Storage(message),
        }
    }
}
