//! Publish and unpublish jobs
//!
//! A submission returns as soon as the scheduler accepts the job. The caller
//! shows the in-progress message and then awaits the watch, which refreshes
//! the published listing when the job succeeds.

use std::sync::Arc;

use modelhub_domain::{JobAction, JobHandle, JobStatusReport, Result};
use modelhub_infra::api::JobRequest;
use modelhub_infra::{JobOutcome, JobWatch, PublishedIndex, Reply};
use serde::Serialize;

use crate::context::AppContext;
use crate::utils::logging::log_job_outcome;

/// Accepted job together with the listing it keeps up to date
#[derive(Debug)]
pub struct StartedJob {
    pub watch: JobWatch,
    pub index: Arc<PublishedIndex>,
}

impl StartedJob {
    pub fn handle(&self) -> &JobHandle {
        self.watch.handle()
    }

    /// Message to show while the job runs.
    pub fn in_progress_message(&self) -> &'static str {
        self.handle().action().in_progress_message()
    }
}

/// Printable result of a finished watch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub action: JobAction,
    pub location: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

/// Submit `request` and start watching the resulting job.
///
/// Returns `None` when the scheduler answered without a job location or the
/// user was sent to log in again.
///
/// # Errors
///
/// Returns error if no region is selected or the submission fails
pub async fn start_job(ctx: &AppContext, request: &JobRequest) -> Result<Option<StartedJob>> {
    let Some(handle) = ctx.commands.submit(request).await? else {
        return Ok(None);
    };

    let model_name = match request {
        JobRequest::Publish { model_name, .. } | JobRequest::Unpublish { model_name, .. } => {
            model_name.clone()
        }
    };
    let index =
        Arc::new(PublishedIndex::new(Arc::new(ctx.commands.clone()), Some(model_name)));
    let watch = ctx.poller.watch(handle, index.clone());

    Ok(Some(StartedJob { watch, index }))
}

/// Wait for a started job to reach a terminal outcome.
pub async fn finish_job(job: StartedJob, run_id: &str) -> JobSummary {
    let StartedJob { watch, index } = job;
    let handle = watch.handle().clone();
    let outcome = watch.outcome().await;

    let published = outcome.is_success().then(|| index.is_published(run_id));
    let (status, error) = match &outcome {
        JobOutcome::Failed(status) => (Some(status.to_string()), None),
        JobOutcome::Errored(err) => (None, Some(err.to_string())),
        _ => (None, None),
    };

    log_job_outcome(handle.location(), &outcome);

    JobSummary {
        action: handle.action(),
        location: handle.location().to_string(),
        outcome: outcome.label(),
        status,
        error,
        published,
    }
}

/// Query the status of a job once.
///
/// # Errors
///
/// Returns error if no region is selected or the query fails
pub async fn job_status(
    ctx: &AppContext,
    action: JobAction,
    location: &str,
) -> Result<Reply<JobStatusReport>> {
    Ok(ctx.commands.publish_job_status(action.status_action_name(), location).await?)
}
