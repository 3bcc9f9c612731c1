//! # ModelHub Infrastructure
//!
//! Everything in the client that performs I/O.
//!
//! This crate contains:
//! - The reqwest transport and the authenticated client policy
//! - Backend resolution (API, data, per-region job scheduler)
//! - Registry REST actions
//! - The long-running job poller and the published-version index
//! - Configuration loading
//!
//! ## Architecture
//! - Depends on `modelhub-domain` for types and `modelhub-common` for the
//!   store and credential manager
//! - Every outbound request goes through [`api::AuthenticatedClient`]

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod jobs;
pub mod navigation;

// Re-export commonly used items
pub use api::{ApiError, ApiErrorKind, AuthenticatedClient, Backends, RegistryCommands, Reply};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use jobs::{JobOutcome, JobPoller, JobWatch, PublishedIndex};
pub use navigation::{LoggingNavigator, Navigator, RecordingNavigator};
