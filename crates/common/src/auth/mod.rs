//! Credential handling for the ModelHub console API
//!
//! Tokens are opaque strings kept in a [`LocalStore`](crate::storage::LocalStore).
//! Expiry is learned only from the server rejecting a request, after which
//! [`CredentialManager::refresh`] exchanges the refresh token for a new pair.
//!
//! ```text
//! ┌────────────────────┐
//! │ CredentialManager  │  single-flight refresh + persistence
//! └─────────┬──────────┘
//!           ├──► RefreshClient  (POST login/refresh_token)
//!           └──► LocalStore     (auth-token / refresh-token)
//! ```

pub mod client;
pub mod credential;
pub mod token_manager;
pub mod traits;
pub mod types;

pub use client::{RefreshClient, RefreshClientError, RefreshConfig, REFRESH_TOKEN_PATH};
pub use credential::{clear_credential, load_credential, set_token};
pub use token_manager::CredentialManager;
pub use traits::RefreshClientTrait;
pub use types::{Credential, RefreshOutcome, RefreshResponse, RefreshTokenRequest, TokenResponse};
