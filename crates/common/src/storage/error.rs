//! Storage error types

use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store document is corrupt: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl ErrorClassification for StorageError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Corrupt(_) => ErrorSeverity::Critical,
            Self::Unavailable(_) => ErrorSeverity::Warning,
            Self::Io(_) | Self::SerdeJson(_) => ErrorSeverity::Error,
        }
    }
}
