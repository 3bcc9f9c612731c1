//! Error classification shared by the ModelHub crates
//!
//! Crate-specific error types implement [`ErrorClassification`] so callers
//! can pick a log level uniformly.
//!
//! | Level | Use Case |
//! |-------|----------|
//! | **Info** | Expected conditions (expired token, invalid refresh) |
//! | **Warning** | Degraded but operational (timeouts, auth rejections) |
//! | **Error** | Failure requiring attention (network, persistence, backend) |
//! | **Critical** | Broken configuration or corrupt state |

use std::fmt;

/// Standard interface for classifying errors
pub trait ErrorClassification {
    /// Get the error severity level
    ///
    /// Used for logging decisions.
    fn severity(&self) -> ErrorSeverity;
}

/// Unified severity levels for logging and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
