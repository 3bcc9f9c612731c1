//! Long-running job poller
//!
//! Drives one submitted job to a terminal status:
//!
//! ```text
//! Submitted --delay--> Polling --non-terminal, delay--> Polling
//!                         |--SUCCESS--> Succeeded (listener notified once)
//!                         `--other terminal--> Failed (no callback)
//! ```
//!
//! The delay is fixed; there is no backoff and no attempt cap.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use modelhub_domain::{JobHandle, JobStatus, JobStatusReport, PollDisposition};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{ApiError, RegistryCommands, Reply};

/// Source of job status reports
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn job_status(&self, handle: &JobHandle) -> Result<Reply<JobStatusReport>, ApiError>;
}

#[async_trait]
impl JobStatusSource for RegistryCommands {
    async fn job_status(&self, handle: &JobHandle) -> Result<Reply<JobStatusReport>, ApiError> {
        self.poll_status(handle).await
    }
}

/// Notified when a watched job succeeds
#[async_trait]
pub trait JobListener: Send + Sync {
    async fn on_success(&self, handle: &JobHandle);
}

/// How a watch ended
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// `SUCCESS` observed
    Succeeded,
    /// Another terminal status observed
    Failed(JobStatus),
    /// Report carried no status fields, or the user was sent to log in
    Abandoned,
    /// The owner cancelled the watch
    Cancelled,
    /// A status query failed
    Errored(ApiError),
}

impl JobOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed(_) => "failed",
            Self::Abandoned => "abandoned",
            Self::Cancelled => "cancelled",
            Self::Errored(_) => "errored",
        }
    }
}

/// Starts one watch per submitted job
#[derive(Clone)]
pub struct JobPoller {
    source: Arc<dyn JobStatusSource>,
    interval: Duration,
}

impl JobPoller {
    /// Create a new poller
    ///
    /// # Arguments
    ///
    /// * `source` - Status endpoint
    /// * `interval` - Delay before the first query and between queries
    pub fn new(source: Arc<dyn JobStatusSource>, interval: Duration) -> Self {
        Self { source, interval }
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn a task polling `handle` until it reaches a terminal status.
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch(&self, handle: JobHandle, listener: Arc<dyn JobListener>) -> JobWatch {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.source),
            handle.clone(),
            listener,
            self.interval,
            cancel.clone(),
        ));

        info!(location = handle.location(), action = %handle.action(), "job watch started");
        JobWatch { handle, cancel, task: Some(task) }
    }
}

impl std::fmt::Debug for JobPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobPoller").field("interval", &self.interval).finish_non_exhaustive()
    }
}

/// Running watch over one job
///
/// Dropping the watch cancels it.
#[derive(Debug)]
pub struct JobWatch {
    handle: JobHandle,
    cancel: CancellationToken,
    task: Option<JoinHandle<JobOutcome>>,
}

impl JobWatch {
    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    /// Stop polling. Takes effect before the next scheduled query.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token that cancels this watch when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the watch to end.
    pub async fn outcome(mut self) -> JobOutcome {
        let Some(task) = self.task.take() else {
            return JobOutcome::Cancelled;
        };

        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, location = self.handle.location(), "job watch task failed");
                JobOutcome::Cancelled
            }
        }
    }
}

impl Drop for JobWatch {
    fn drop(&mut self) {
        if self.task.as_ref().is_some_and(|task| !task.is_finished())
            && !self.cancel.is_cancelled()
        {
            debug!(location = self.handle.location(), "job watch dropped while running; cancelling");
        }
        self.cancel.cancel();
    }
}

#[instrument(skip(source, listener, cancel), fields(location = handle.location(), action = %handle.action()))]
async fn poll_loop(
    source: Arc<dyn JobStatusSource>,
    handle: JobHandle,
    listener: Arc<dyn JobListener>,
    interval: Duration,
    cancel: CancellationToken,
) -> JobOutcome {
    let mut queries: u64 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(queries, "job watch cancelled");
                return JobOutcome::Cancelled;
            }
            () = tokio::time::sleep(interval) => {}
        }

        queries += 1;
        let report = match source.job_status(&handle).await {
            Ok(Reply::Data(report)) => report,
            Ok(Reply::Redirected) => {
                warn!(queries, "status query redirected to login; abandoning watch");
                return JobOutcome::Abandoned;
            }
            Err(err) => {
                error!(queries, kind = %err.kind(), error = %err, "status query failed");
                return JobOutcome::Errored(err);
            }
        };

        match report.disposition() {
            PollDisposition::Continue => {
                debug!(queries, status = ?report.build_status, "job still running");
            }
            PollDisposition::Succeeded => {
                if cancel.is_cancelled() {
                    debug!(queries, "job succeeded after watch was cancelled");
                } else {
                    listener.on_success(&handle).await;
                }
                return JobOutcome::Succeeded;
            }
            PollDisposition::Failed(status) => return JobOutcome::Failed(status),
            PollDisposition::Abandoned => return JobOutcome::Abandoned,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use modelhub_domain::JobAction;
    use parking_lot::Mutex;
    use tokio::time::Instant;

    use super::*;

    const INTERVAL: Duration = Duration::from_millis(5000);

    /// Replays scripted reports and records when each query happened.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Reply<JobStatusReport>, ApiError>>>,
        queried_at: Mutex<Vec<Instant>>,
    }

    impl ScriptedSource {
        fn statuses(statuses: &[&str]) -> Arc<Self> {
            Self::new(
                statuses.iter().map(|s| Ok(Reply::Data(JobStatusReport::with_status(*s)))).collect(),
            )
        }

        fn new(script: VecDeque<Result<Reply<JobStatusReport>, ApiError>>) -> Arc<Self> {
            Arc::new(Self { script: Mutex::new(script), queried_at: Mutex::new(Vec::new()) })
        }

        fn queries(&self) -> Vec<Instant> {
            self.queried_at.lock().clone()
        }
    }

    #[async_trait]
    impl JobStatusSource for ScriptedSource {
        async fn job_status(&self, _handle: &JobHandle) -> Result<Reply<JobStatusReport>, ApiError> {
            self.queried_at.lock().push(Instant::now());
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(Reply::Data(JobStatusReport::with_status("IN PROGRESS"))))
        }
    }

    #[derive(Default)]
    struct CountingListener {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl JobListener for CountingListener {
        async fn on_success(&self, _handle: &JobHandle) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn handle() -> JobHandle {
        JobHandle::new("queue/7", JobAction::Publish)
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_success_with_fixed_spacing() {
        let source = ScriptedSource::statuses(&["IN PROGRESS", "IN PROGRESS", "SUCCESS"]);
        let listener = Arc::new(CountingListener::default());
        let poller = JobPoller::new(source.clone(), INTERVAL);

        let started = Instant::now();
        let outcome = poller.watch(handle(), listener.clone()).outcome().await;

        assert!(outcome.is_success());
        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);

        let queries = source.queries();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0] - started, INTERVAL);
        assert_eq!(queries[1] - queries[0], INTERVAL);
        assert_eq!(queries[2] - queries[1], INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_stops_without_callback() {
        let source = ScriptedSource::statuses(&["FAILED"]);
        let listener = Arc::new(CountingListener::default());
        let poller = JobPoller::new(source.clone(), INTERVAL);

        let outcome = poller.watch(handle(), listener.clone()).outcome().await;

        assert!(matches!(outcome, JobOutcome::Failed(JobStatus::Failed)));
        assert_eq!(source.queries().len(), 1);
        assert_eq!(listener.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn report_without_fields_is_abandoned() {
        let source = ScriptedSource::new(VecDeque::from([Ok(Reply::Data(JobStatusReport::default()))]));
        let listener = Arc::new(CountingListener::default());

        let outcome = JobPoller::new(source.clone(), INTERVAL).watch(handle(), listener.clone()).outcome().await;

        assert!(matches!(outcome, JobOutcome::Abandoned));
        assert_eq!(listener.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn query_error_stops_polling() {
        let source = ScriptedSource::new(VecDeque::from([Err(ApiError::Status {
            status: 500,
            url: "u".into(),
            body: String::new(),
        })]));
        let listener = Arc::new(CountingListener::default());

        let outcome = JobPoller::new(source.clone(), INTERVAL).watch(handle(), listener).outcome().await;

        assert!(matches!(outcome, JobOutcome::Errored(ApiError::Status { status: 500, .. })));
        assert_eq!(source.queries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn redirect_abandons_watch() {
        let source = ScriptedSource::new(VecDeque::from([Ok(Reply::Redirected)]));
        let listener = Arc::new(CountingListener::default());

        let outcome = JobPoller::new(source, INTERVAL).watch(handle(), listener).outcome().await;
        assert!(matches!(outcome, JobOutcome::Abandoned));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_stops_further_queries() {
        let source = ScriptedSource::statuses(&[]);
        let listener = Arc::new(CountingListener::default());
        let watch = JobPoller::new(source.clone(), INTERVAL).watch(handle(), listener.clone());

        tokio::time::sleep(INTERVAL * 2 + Duration::from_millis(1)).await;
        assert_eq!(source.queries().len(), 2);

        watch.cancel();
        let outcome = watch.outcome().await;
        tokio::time::sleep(INTERVAL * 3).await;

        assert!(matches!(outcome, JobOutcome::Cancelled));
        assert_eq!(source.queries().len(), 2);
        assert_eq!(listener.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_watch_cancels_it() {
        let source = ScriptedSource::statuses(&[]);
        let listener = Arc::new(CountingListener::default());
        let watch = JobPoller::new(source.clone(), INTERVAL).watch(handle(), listener);

        tokio::time::sleep(INTERVAL + Duration::from_millis(1)).await;
        drop(watch);
        tokio::time::sleep(INTERVAL * 4).await;

        assert_eq!(source.queries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn resubmission_gets_an_independent_watch() {
        let first_source = ScriptedSource::statuses(&["IN PROGRESS", "IN PROGRESS", "SUCCESS"]);
        let second_source = ScriptedSource::statuses(&["SUCCESS"]);
        let listener = Arc::new(CountingListener::default());

        let first = JobPoller::new(first_source.clone(), INTERVAL)
            .watch(JobHandle::new("queue/1", JobAction::Publish), listener.clone());
        let second = JobPoller::new(second_source.clone(), INTERVAL)
            .watch(JobHandle::new("queue/2", JobAction::Publish), listener.clone());

        assert_ne!(first.handle(), second.handle());
        let second_outcome = second.outcome().await;
        first.cancel();
        let first_outcome = first.outcome().await;

        assert!(second_outcome.is_success());
        assert!(matches!(first_outcome, JobOutcome::Cancelled));
        assert_eq!(second_source.queries().len(), 1);
        assert!(first_source.queries().len() <= 1);
        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
    }
}
