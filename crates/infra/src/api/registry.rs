//! Model registry REST actions
//!
//! Provides the publish/unpublish submissions, the job status query and the
//! published-model listing on top of the backend clients.

use std::sync::Arc;

use modelhub_common::storage::keys;
use modelhub_domain::constants::MODULE_JOB_SCHEDULER;
use modelhub_domain::{
    JobAction, JobHandle, JobStatusReport, PublishModelRequest, PublishSubmission, PublishedModel,
};
use tracing::{debug, info, instrument};

use super::auth::{ApiRequest, AuthenticatedClient, Reply};
use super::backends::Backends;
use super::errors::ApiError;

const PUBLISH_MODEL_PATH: &str = "v1/publish_model";
const JOB_STATUS_PATH: &str = "v1/jenkins_status";
const PUBLISHED_MODELS_PATH: &str = "published_models";

/// Job submission for one model version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRequest {
    Publish { run_id: String, model_name: String, version: String },
    Unpublish { run_id: String, model_name: String },
}

impl JobRequest {
    pub const fn action(&self) -> JobAction {
        match self {
            Self::Publish { .. } => JobAction::Publish,
            Self::Unpublish { .. } => JobAction::Unpublish,
        }
    }
}

/// Registry commands for the signed-in user
#[derive(Debug, Clone)]
pub struct RegistryCommands {
    backends: Arc<Backends>,
}

impl RegistryCommands {
    /// Create a new commands instance
    ///
    /// # Arguments
    ///
    /// * `backends` - Backend clients sharing one session
    pub fn new(backends: Arc<Backends>) -> Self {
        Self { backends }
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    /// Scheduler client for the region held in the local store
    ///
    /// # Errors
    ///
    /// Returns `Config` if no region is selected or it is not configured
    pub fn scheduler(&self) -> Result<&AuthenticatedClient, ApiError> {
        let region = self
            .backends
            .credentials()
            .store()
            .get_item(keys::REGION)?
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| ApiError::Config("no region selected".to_string()))?;
        self.backends.region_client(MODULE_JOB_SCHEDULER, &region)
    }

    // === Jobs ===

    /// Submit `POST v1/publish_model` for a model version
    ///
    /// The project id is read from the local store.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler cannot be resolved or the request fails
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn publish_model_version(
        &self,
        run_id: &str,
        model_name: &str,
        version: &str,
    ) -> Result<Reply<PublishSubmission>, ApiError> {
        let project_id =
            self.backends.credentials().store().get_item(keys::DISPLAY_PROJECT_ID)?;
        let payload = PublishModelRequest {
            project_id,
            run_id: run_id.to_string(),
            model_name: model_name.to_string(),
            version: version.to_string(),
        };

        let request = ApiRequest::post(PUBLISH_MODEL_PATH).json(&payload)?;
        self.scheduler()?.send_json(&request).await
    }

    /// Submit `DELETE v1/publish_model/{run_id}?name=<name>`
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler cannot be resolved or the request fails
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn remove_model_version(
        &self,
        run_id: &str,
        model_name: &str,
    ) -> Result<Reply<PublishSubmission>, ApiError> {
        let request =
            ApiRequest::delete(PUBLISH_MODEL_PATH).segment(run_id).query("name", model_name);
        self.scheduler()?.send_json(&request).await
    }

    /// Submit a publish or unpublish job
    ///
    /// # Returns
    ///
    /// A fresh handle, or `None` if the scheduler answered without a build
    /// location or the user was redirected to log in again
    ///
    /// # Errors
    ///
    /// Returns error if the submission fails
    pub async fn submit(&self, request: &JobRequest) -> Result<Option<JobHandle>, ApiError> {
        let action = request.action();
        let reply = match request {
            JobRequest::Publish { run_id, model_name, version } => {
                self.publish_model_version(run_id, model_name, version).await?
            }
            JobRequest::Unpublish { run_id, model_name } => {
                self.remove_model_version(run_id, model_name).await?
            }
        };

        let handle = reply.into_option().and_then(|s| s.into_handle(action));
        match &handle {
            Some(handle) => info!(%action, location = handle.location(), "job accepted"),
            None => debug!(%action, "submission returned no job location"),
        }
        Ok(handle)
    }

    /// Query `GET v1/jenkins_status?action=..&location=..`
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler cannot be resolved or the request fails
    #[instrument(skip(self))]
    pub async fn publish_job_status(
        &self,
        action_name: &str,
        location: &str,
    ) -> Result<Reply<JobStatusReport>, ApiError> {
        let request = ApiRequest::get(JOB_STATUS_PATH)
            .query("action", action_name)
            .query("location", location);
        self.scheduler()?.send_json(&request).await
    }

    /// Status of the job behind `handle`
    ///
    /// # Errors
    ///
    /// See [`publish_job_status`](Self::publish_job_status)
    pub async fn poll_status(&self, handle: &JobHandle) -> Result<Reply<JobStatusReport>, ApiError> {
        self.publish_job_status(handle.action().status_action_name(), handle.location()).await
    }

    // === Listings ===

    /// List published models on the data backend, optionally for one model
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    #[instrument(skip(self))]
    pub async fn get_published_models(
        &self,
        name: Option<&str>,
    ) -> Result<Reply<Vec<PublishedModel>>, ApiError> {
        let mut request = ApiRequest::get(PUBLISHED_MODELS_PATH);
        if let Some(name) = name {
            request = request.query("name", name);
        }
        let reply: Reply<Option<Vec<PublishedModel>>> =
            self.backends.data().send_json(&request).await?;
        Ok(reply.map(Option::unwrap_or_default))
    }
}
