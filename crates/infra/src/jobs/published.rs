//! Published-version index
//!
//! Keeps the set of run ids that currently have a published artifact for
//! one model. A successful job refreshes it; the model-version listing is
//! decorated from it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use modelhub_domain::{mark_published, JobHandle, ModelVersion, ModelVersionRow, PublishedModel};
use parking_lot::RwLock;
use tracing::{debug, info};

use super::poller::JobListener;
use crate::api::{log_api_error, ApiError, RegistryCommands, Reply};

/// Source of published-model listings
#[async_trait]
pub trait PublishedModelSource: Send + Sync {
    async fn published_models(&self, name: Option<&str>) -> Result<Reply<Vec<PublishedModel>>, ApiError>;
}

#[async_trait]
impl PublishedModelSource for RegistryCommands {
    async fn published_models(&self, name: Option<&str>) -> Result<Reply<Vec<PublishedModel>>, ApiError> {
        self.get_published_models(name).await
    }
}

/// Published run ids for one model (or for all models)
pub struct PublishedIndex {
    source: Arc<dyn PublishedModelSource>,
    model_name: Option<String>,
    run_ids: RwLock<HashSet<String>>,
    refreshes: AtomicU64,
}

impl PublishedIndex {
    pub fn new(source: Arc<dyn PublishedModelSource>, model_name: Option<String>) -> Self {
        Self {
            source,
            model_name,
            run_ids: RwLock::new(HashSet::new()),
            refreshes: AtomicU64::new(0),
        }
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    /// Reload the published listing.
    ///
    /// Returns the number of published run ids, or `None` if the request
    /// ended in a login redirect (the index is left unchanged).
    ///
    /// # Errors
    ///
    /// Returns error if the listing request fails
    pub async fn refresh(&self) -> Result<Option<usize>, ApiError> {
        let reply = self.source.published_models(self.model_name.as_deref()).await?;
        let Reply::Data(models) = reply else {
            return Ok(None);
        };

        let run_ids: HashSet<String> = models.into_iter().map(|m| m.run_id).collect();
        let count = run_ids.len();
        *self.run_ids.write() = run_ids;
        self.refreshes.fetch_add(1, Ordering::SeqCst);

        debug!(model = ?self.model_name, count, "published index refreshed");
        Ok(Some(count))
    }

    pub fn is_published(&self, run_id: &str) -> bool {
        self.run_ids.read().contains(run_id)
    }

    pub fn run_ids(&self) -> HashSet<String> {
        self.run_ids.read().clone()
    }

    /// Number of successful refreshes so far
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Decorate `versions` with their publication state.
    pub fn mark(&self, versions: &[ModelVersion]) -> Vec<ModelVersionRow> {
        mark_published(versions, &self.run_ids.read())
    }
}

#[async_trait]
impl JobListener for PublishedIndex {
    async fn on_success(&self, handle: &JobHandle) {
        info!(location = handle.location(), action = %handle.action(), "job succeeded; refreshing published models");
        if let Err(err) = self.refresh().await {
            log_api_error(&err, "failed to refresh published models");
        }
    }
}

impl std::fmt::Debug for PublishedIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishedIndex")
            .field("model_name", &self.model_name)
            .field("published", &self.run_ids.read().len())
            .finish_non_exhaustive()
    }
}
