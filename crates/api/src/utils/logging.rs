use std::time::Duration;

use modelhub_domain::ModelHubError;
use modelhub_infra::api::log_api_error;
use modelhub_infra::JobOutcome;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,modelhub_infra=info,modelhub_common=warn";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Logs go to stderr so command
/// output on stdout stays machine-readable.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let installed =
        if json { builder.json().try_init() } else { builder.with_target(false).try_init() };
    installed.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"jobs::publish"`).
/// * `elapsed` - Duration the command execution took.
/// * `error` - Failure label, if the command failed.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error: Option<&str>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(error_type) => warn!(command, duration_ms, error_type, "command_execution_failure"),
    }
}

/// Log how a job watch ended.
#[inline]
pub fn log_job_outcome(location: &str, outcome: &JobOutcome) {
    match outcome {
        JobOutcome::Succeeded => info!(location, outcome = outcome.label(), "job_outcome"),
        JobOutcome::Failed(status) => {
            warn!(location, outcome = outcome.label(), status = %status, "job_outcome");
        }
        JobOutcome::Errored(err) => {
            tracing::info_span!("job_outcome", location, outcome = outcome.label())
                .in_scope(|| log_api_error(err, "job_outcome"));
        }
        JobOutcome::Abandoned | JobOutcome::Cancelled => {
            info!(location, outcome = outcome.label(), "job_outcome");
        }
    }
}

/// Convert a `ModelHubError` into a stable label suitable for logging.
#[inline]
pub const fn error_label(error: &ModelHubError) -> &'static str {
    match error {
        ModelHubError::Config(_) => "config",
        ModelHubError::Storage(_) => "storage",
        ModelHubError::Network(_) => "network",
        ModelHubError::Auth(_) => "auth",
        ModelHubError::NotFound(_) => "not_found",
        ModelHubError::InvalidInput(_) => "invalid_input",
        ModelHubError::Internal(_) => "internal",
    }
}
