//! Published model listings

use modelhub_domain::{PublishedModel, Result};
use modelhub_infra::Reply;
use tracing::info;

use crate::context::AppContext;

/// List published models, optionally for a single model name.
///
/// # Errors
///
/// Returns error if the data backend request fails
pub async fn list_published(
    ctx: &AppContext,
    name: Option<&str>,
) -> Result<Reply<Vec<PublishedModel>>> {
    let reply = ctx.commands.get_published_models(name).await?;
    if let Reply::Data(models) = &reply {
        info!(model = ?name, count = models.len(), "published models listed");
    }
    Ok(reply)
}
