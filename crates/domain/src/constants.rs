//! Application constants
//!
//! Centralized location for domain-level constants shared by the client,
//! the poller and the application shell.

// Job polling
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const STATUS_ACTION_PUBLISH: &str = "mlflow-publish";
pub const STATUS_ACTION_UNPUBLISH: &str = "mlflow-remove-version";

/// Job statuses after which the backend never changes state again.
pub const TERMINAL_JOB_STATUSES: [&str; 5] = ["FAILED", "FAILURE", "SUCCESS", "ABORTED", "CANCELLED"];

// Authentication
pub const EXPIRED_TOKEN_MARKER: &str = "access_token expired";
pub const DEFAULT_REFRESH_BACKEND_TAG: &str = "imax";

// HTTP
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// Backend modules that are addressed per region
pub const MODULE_JOB_SCHEDULER: &str = "job_scheduler";

// User-facing progress messages
pub const PUBLISH_IN_PROGRESS_MESSAGE: &str = "The hosting process for this model version is presently underway. Upon completion, a URL for public access will be furnished on the same page. If a previous version of the model was hosted, the new model will be available at the same URL.";
pub const UNPUBLISH_IN_PROGRESS_MESSAGE: &str = "The process of unpublishing for this model version is currently in progress. Once finished, the URL for public access will be deactivated.";
pub const MODEL_URL_MESSAGE: &str = "Once the hosting is complete, model can be accessed via url:";
