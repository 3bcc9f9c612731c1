//! Model registry payloads

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST v1/publish_model`
///
/// Field names follow the scheduler's wire format, including the
/// `Model_name` spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishModelRequest {
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
    #[serde(rename = "runID")]
    pub run_id: String,
    #[serde(rename = "Model_name")]
    pub model_name: String,
    pub version: String,
}

/// Entry of `GET published_models`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedModel {
    pub run_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Registered model version as listed by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub name: String,
    pub version: String,
    pub run_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Model version decorated with its publication state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersionRow {
    #[serde(flatten)]
    pub version: ModelVersion,
    pub published: bool,
}

/// Mark each version whose run id appears among the published run ids.
pub fn mark_published(
    versions: &[ModelVersion],
    published_run_ids: &HashSet<String>,
) -> Vec<ModelVersionRow> {
    versions
        .iter()
        .map(|v| ModelVersionRow {
            published: published_run_ids.contains(&v.run_id),
            version: v.clone(),
        })
        .collect()
}
