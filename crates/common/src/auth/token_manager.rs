//! Credential manager with single-flight refresh
//!
//! Owns the path from "the server said the access token expired" to "a
//! usable credential is in the store":
//! - Token retrieval from the local store at send time
//! - One refresh exchange per expired token, however many requests hit it
//! - Persisting the new pair before any waiter resumes

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::credential::{clear_credential, load_credential, set_token};
use super::traits::RefreshClientTrait;
use super::types::{Credential, RefreshOutcome, RefreshResponse, TokenResponse};
use crate::storage::{LocalStore, StorageResult};

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Exchange in progress, keyed by the access token it replaces
struct InFlight {
    stale: Option<String>,
    future: SharedRefresh,
}

/// Credential manager shared by every request of a client
///
/// Cheap to clone; clones share the store and the in-flight exchange.
#[derive(Clone)]
pub struct CredentialManager {
    client: Arc<dyn RefreshClientTrait>,
    store: Arc<dyn LocalStore>,
    inflight: Arc<Mutex<Option<InFlight>>>,
    exchanges: Arc<AtomicU64>,
}

impl CredentialManager {
    /// Create a new credential manager
    ///
    /// # Arguments
    /// * `client` - Refresh endpoint client
    /// * `store` - Local store holding `auth-token` and `refresh-token`
    #[must_use]
    pub fn new(client: Arc<dyn RefreshClientTrait>, store: Arc<dyn LocalStore>) -> Self {
        Self {
            client,
            store,
            inflight: Arc::new(Mutex::new(None)),
            exchanges: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    /// Credential currently in the store.
    ///
    /// # Errors
    /// Propagates store read failures.
    pub fn credential(&self) -> StorageResult<Option<Credential>> {
        load_credential(self.store.as_ref())
    }

    /// Access token currently in the store.
    ///
    /// # Errors
    /// Propagates store read failures.
    pub fn access_token(&self) -> StorageResult<Option<String>> {
        Ok(self.credential()?.map(|c| c.access_token))
    }

    /// Store tokens obtained outside a refresh (login).
    ///
    /// # Errors
    /// Propagates store write failures.
    pub fn store_tokens(&self, tokens: &TokenResponse) -> StorageResult<()> {
        set_token(self.store.as_ref(), tokens)
    }

    /// Forget both tokens.
    ///
    /// # Errors
    /// Propagates store write failures.
    pub fn clear(&self) -> StorageResult<()> {
        clear_credential(self.store.as_ref())
    }

    /// Number of refresh exchanges sent so far
    #[must_use]
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::SeqCst)
    }

    /// Obtain a credential newer than `stale_access_token`.
    ///
    /// If the store already holds a different access token (another request
    /// refreshed first) that credential is returned without contacting the
    /// server. Concurrent callers with the same stale token share a single
    /// exchange and all observe its outcome.
    pub async fn refresh(&self, stale_access_token: Option<&str>) -> RefreshOutcome {
        let future = {
            let mut inflight = self.inflight.lock();
            match inflight.as_ref() {
                Some(pending) if pending.stale.as_deref() == stale_access_token => {
                    debug!("joining in-flight token refresh");
                    pending.future.clone()
                }
                _ => {
                    match self.credential() {
                        Ok(Some(current))
                            if Some(current.access_token.as_str()) != stale_access_token =>
                        {
                            debug!("access token already rotated; skipping exchange");
                            return RefreshOutcome::Refreshed(current);
                        }
                        Ok(_) => {}
                        Err(err) => {
                            error!(error = %err, "failed to read credential before refresh");
                            return RefreshOutcome::Failed(err.to_string());
                        }
                    }

                    let stale = stale_access_token.map(str::to_owned);
                    let future = self.start_exchange(stale.clone());
                    *inflight = Some(InFlight { stale, future: future.clone() });
                    future
                }
            }
        };

        future.await
    }

    fn start_exchange(&self, stale: Option<String>) -> SharedRefresh {
        let client = Arc::clone(&self.client);
        let store = Arc::clone(&self.store);
        let inflight = Arc::clone(&self.inflight);
        let exchanges = Arc::clone(&self.exchanges);

        async move {
            let outcome = exchange(client.as_ref(), store.as_ref(), &exchanges).await;

            let mut slot = inflight.lock();
            if slot.as_ref().is_some_and(|pending| pending.stale == stale) {
                *slot = None;
            }
            outcome
        }
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("refresh_in_flight", &self.inflight.lock().is_some())
            .field("exchanges", &self.exchange_count())
            .finish_non_exhaustive()
    }
}

async fn exchange(
    client: &dyn RefreshClientTrait,
    store: &dyn LocalStore,
    exchanges: &AtomicU64,
) -> RefreshOutcome {
    let current = match load_credential(store) {
        Ok(current) => current,
        Err(err) => return RefreshOutcome::Failed(err.to_string()),
    };

    let Some(refresh_token) = current.as_ref().and_then(|c| c.refresh_token.clone()) else {
        warn!("access token expired and no refresh token is stored");
        return RefreshOutcome::MissingRefreshToken;
    };
    let bearer = current.map(|c| c.access_token);

    exchanges.fetch_add(1, Ordering::SeqCst);
    info!("refreshing expired access token");

    match client.refresh_access_token(&refresh_token, bearer.as_deref()).await {
        Ok(RefreshResponse::Issued(tokens)) => {
            if let Err(err) = set_token(store, &tokens) {
                error!(error = %err, "failed to persist refreshed tokens");
                return RefreshOutcome::Failed(err.to_string());
            }
            match load_credential(store) {
                Ok(Some(credential)) => {
                    info!("access token refreshed");
                    RefreshOutcome::Refreshed(credential)
                }
                Ok(None) => {
                    RefreshOutcome::Failed("refresh response carried no access token".to_string())
                }
                Err(err) => RefreshOutcome::Failed(err.to_string()),
            }
        }
        Ok(RefreshResponse::Invalid) => {
            warn!("refresh token rejected; login required");
            RefreshOutcome::Invalid
        }
        Ok(RefreshResponse::Rejected { status, body }) => {
            error!(status, "token refresh failed");
            RefreshOutcome::Failed(format!("refresh endpoint returned {status}: {body}"))
        }
        Err(err) => {
            error!(error = %err, "token refresh request failed");
            RefreshOutcome::Failed(err.to_string())
        }
    }
}
