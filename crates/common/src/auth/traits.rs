//! Traits for credential refresh
//!
//! Abstracts the refresh endpoint so the credential manager can be tested
//! without a server.

use async_trait::async_trait;

use super::client::RefreshClientError;
use super::types::RefreshResponse;

/// Trait for exchanging a refresh token for new credentials
#[async_trait]
pub trait RefreshClientTrait: Send + Sync {
    /// Exchange `refresh_token` for a new token pair
    ///
    /// # Arguments
    /// * `refresh_token` - Refresh token from the local store
    /// * `access_token` - Current (expired) access token, sent as bearer
    ///
    /// # Errors
    /// Returns error if the request cannot be sent or the 201 body cannot be
    /// parsed. Non-201 statuses are reported through [`RefreshResponse`].
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
        access_token: Option<&str>,
    ) -> Result<RefreshResponse, RefreshClientError>;
}
