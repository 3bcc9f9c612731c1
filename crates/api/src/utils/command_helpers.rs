//! Command execution helpers
//!
//! Wraps each command in a span carrying a fresh invocation id and logs its
//! duration and outcome.

use std::future::Future;
use std::time::Instant;

use modelhub_domain::Result as DomainResult;
use tracing::Instrument;
use uuid::Uuid;

use crate::utils::logging::{error_label, log_command_execution};

/// Execute a command with timing and outcome logging
///
/// # Example
///
/// ```rust,ignore
/// let models = execute_logged("published::list", || async {
///     list_published(&ctx, name).await
/// })
/// .await?;
/// ```
pub async fn execute_logged<F, Fut, T>(command_name: &str, command_fn: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let span = tracing::info_span!("command", command = command_name, invocation = %Uuid::new_v4());
    let start = Instant::now();

    let result = command_fn().instrument(span).await;

    let error_type = result.as_ref().err().map(error_label);
    log_command_execution(command_name, start.elapsed(), error_type);

    result
}
