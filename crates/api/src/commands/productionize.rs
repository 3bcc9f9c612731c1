//! Serving address of a productionized model version

use modelhub_common::storage::keys;
use modelhub_domain::{ModelHubError, Result};
use modelhub_infra::ApiError;
use tracing::info;

use crate::context::AppContext;

/// Address a model version is served from once hosting completes.
///
/// Built as `{static_proxy_target}{project}/{experiment_id}-{run_id}` with
/// the project taken from the store.
///
/// # Errors
///
/// Returns `InvalidInput` for a blank run or experiment id, `Config` if no
/// static proxy target is configured, `NotFound` if no project is selected
pub fn model_url(ctx: &AppContext, run_id: &str, experiment_id: &str) -> Result<String> {
    if run_id.trim().is_empty() || experiment_id.trim().is_empty() {
        return Err(ModelHubError::InvalidInput(
            "run id and experiment id must not be empty".to_string(),
        ));
    }

    let target = ctx.config.api.static_proxy_target.as_deref().ok_or_else(|| {
        ModelHubError::Config("static proxy target is not configured".to_string())
    })?;
    let project_id = ctx
        .store
        .get_item(keys::DISPLAY_PROJECT_ID)
        .map_err(ApiError::from)?
        .ok_or_else(|| ModelHubError::NotFound("no project selected".to_string()))?;

    let url = format!("{target}{project_id}/{experiment_id}-{run_id}");
    info!(run_id, experiment_id, %url, "model serving address resolved");
    Ok(url)
}
