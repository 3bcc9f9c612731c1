//! Console API clients
//!
//! This module provides the HTTP-based clients for the console backends.
//! It handles authentication, token refresh, backend resolution and the
//! registry actions.
//!
//! # Architecture
//!
//! - Uses [`HttpClient`](crate::http::HttpClient) (no direct reqwest)
//! - One [`AuthenticatedClient`] per backend, all sharing one [`Session`]
//! - Expired tokens are refreshed once per request, single-flight across
//!   requests

pub mod auth;
pub mod backends;
pub mod errors;
pub mod registry;

pub use auth::{ApiRequest, AuthenticatedClient, Reply, Session};
pub use backends::{normalize_region, Backends};
pub use errors::{log_api_error, ApiError, ApiErrorKind};
pub use registry::{JobRequest, RegistryCommands};
