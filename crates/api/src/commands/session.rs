//! Sign-in state and user selections kept in the local store

use modelhub_common::auth::TokenResponse;
use modelhub_common::storage::keys;
use modelhub_domain::constants::MODULE_JOB_SCHEDULER;
use modelhub_domain::{ModelHubError, Result};
use modelhub_infra::api::normalize_region;
use modelhub_infra::ApiError;
use tracing::info;

use crate::context::AppContext;

/// Launch parameters handed over by the login page
#[derive(Debug, Clone, Default)]
pub struct LoginDetails {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub project_id: Option<String>,
    pub repo_name: Option<String>,
    pub username: Option<String>,
}

impl LoginDetails {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), ..Self::default() }
    }
}

/// Seed the store with the tokens and selections obtained from the login
/// page. Absent optional fields leave their stored values untouched.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty access token or project id, `Storage`
/// if the store cannot be written
pub fn login(ctx: &AppContext, details: &LoginDetails) -> Result<()> {
    if details.access_token.trim().is_empty() {
        return Err(ModelHubError::InvalidInput("access token must not be empty".to_string()));
    }
    if details.project_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
        return Err(ModelHubError::InvalidInput("project id must not be empty".to_string()));
    }

    let tokens = TokenResponse {
        access_token: Some(details.access_token.clone()),
        refresh_token: details.refresh_token.clone(),
    };
    ctx.credentials().store_tokens(&tokens).map_err(ApiError::from)?;

    if let Some(project_id) = &details.project_id {
        select_project(ctx, project_id)?;
    }
    for (key, value) in [(keys::REPO_NAME, &details.repo_name), (keys::USERNAME, &details.username)] {
        if let Some(value) = value {
            ctx.store.set_item(key, value).map_err(ApiError::from)?;
        }
    }

    info!(
        has_refresh_token = tokens.refresh_token.is_some(),
        has_project = details.project_id.is_some(),
        "credentials stored"
    );
    Ok(())
}

/// Forget the stored credential pair.
///
/// # Errors
///
/// Returns `Storage` if the store cannot be written
pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.credentials().clear().map_err(ApiError::from)?;
    ctx.store.remove_item(keys::USERNAME).map_err(ApiError::from)?;
    info!("credentials cleared");
    Ok(())
}

/// Select the region whose job scheduler receives submissions.
///
/// Returns the normalized region key.
///
/// # Errors
///
/// Returns `Config` if no scheduler is configured for the region
pub fn select_region(ctx: &AppContext, region: &str) -> Result<String> {
    let backends = ctx.commands.backends();
    let client = backends.region_client(MODULE_JOB_SCHEDULER, region)?;
    ctx.store.set_item(keys::REGION, region).map_err(ApiError::from)?;

    let key = normalize_region(region);
    info!(region = %key, backend = client.name(), "region selected");
    Ok(key)
}

/// Select the project sent along with publish submissions.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty id, `Storage` if the store cannot be
/// written
pub fn select_project(ctx: &AppContext, project_id: &str) -> Result<()> {
    if project_id.trim().is_empty() {
        return Err(ModelHubError::InvalidInput("project id must not be empty".to_string()));
    }
    ctx.store.set_item(keys::DISPLAY_PROJECT_ID, project_id).map_err(ApiError::from)?;
    info!(project_id, "project selected");
    Ok(())
}
