//! Asynchronous publish/unpublish job types
//!
//! A submission to the job scheduler answers with a build location; the
//! status endpoint is then polled with that location until a terminal
//! status comes back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::{
    PUBLISH_IN_PROGRESS_MESSAGE, STATUS_ACTION_PUBLISH, STATUS_ACTION_UNPUBLISH,
    UNPUBLISH_IN_PROGRESS_MESSAGE,
};
use crate::errors::ModelHubError;

/// Kind of job submitted for a model version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobAction {
    Publish,
    Unpublish,
}

impl JobAction {
    /// Action name the status endpoint is keyed by.
    #[must_use]
    pub const fn status_action_name(self) -> &'static str {
        match self {
            Self::Publish => STATUS_ACTION_PUBLISH,
            Self::Unpublish => STATUS_ACTION_UNPUBLISH,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "Publish",
            Self::Unpublish => "Unpublish",
        }
    }

    /// Message shown to the user once the job has been accepted.
    #[must_use]
    pub const fn in_progress_message(self) -> &'static str {
        match self {
            Self::Publish => PUBLISH_IN_PROGRESS_MESSAGE,
            Self::Unpublish => UNPUBLISH_IN_PROGRESS_MESSAGE,
        }
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobAction {
    type Err = ModelHubError;

    /// Accepts the display name (`Publish`) or the status action name
    /// (`mlflow-publish`), case-insensitively for the former.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_ACTION_PUBLISH => Ok(Self::Publish),
            STATUS_ACTION_UNPUBLISH => Ok(Self::Unpublish),
            other if other.eq_ignore_ascii_case("publish") => Ok(Self::Publish),
            other if other.eq_ignore_ascii_case("unpublish") => Ok(Self::Unpublish),
            other => Err(ModelHubError::InvalidInput(format!("unknown job action: {other}"))),
        }
    }
}

/// Reference to a job accepted by the scheduler.
///
/// Each submission yields a fresh handle; handles are never reused across
/// submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    location: String,
    action: JobAction,
}

impl JobHandle {
    #[must_use]
    pub fn new(location: impl Into<String>, action: JobAction) -> Self {
        Self { location: location.into(), action }
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub const fn action(&self) -> JobAction {
        self.action
    }
}

/// Server-defined job status.
///
/// The set is open-ended; anything outside the five terminal values is
/// treated as still running.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Failed,
    Failure,
    Success,
    Aborted,
    Cancelled,
    Other(String),
}

impl JobStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Failed => "FAILED",
            Self::Failure => "FAILURE",
            Self::Success => "SUCCESS",
            Self::Aborted => "ABORTED",
            Self::Cancelled => "CANCELLED",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "FAILED" => Self::Failed,
            "FAILURE" => Self::Failure,
            "SUCCESS" => Self::Success,
            "ABORTED" => Self::Aborted,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the poller should do after reading one status report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDisposition {
    /// Job still running; query again after the interval.
    Continue,
    /// Job finished with `SUCCESS`.
    Succeeded,
    /// Job finished with another terminal status.
    Failed(JobStatus),
    /// Report carried neither a status nor a build number.
    Abandoned,
}

/// Body of `GET v1/jenkins_status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatusReport {
    #[serde(
        default,
        deserialize_with = "status_from_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub build_status: Option<JobStatus>,
    #[serde(rename = "build_number_", default, skip_serializing_if = "Option::is_none")]
    pub build_number: Option<Value>,
}

impl JobStatusReport {
    #[must_use]
    pub fn with_status(status: impl Into<JobStatus>) -> Self {
        Self { build_status: Some(status.into()), build_number: None }
    }

    /// Classify the report.
    ///
    /// Polling continues only while the report carries a non-empty status or
    /// a non-empty build number and the status is not terminal.
    #[must_use]
    pub fn disposition(&self) -> PollDisposition {
        let has_status = self.build_status.as_ref().is_some_and(|s| !s.as_str().is_empty());
        let has_build_number = self.build_number.as_ref().is_some_and(is_present);
        let terminal = self.build_status.as_ref().is_some_and(JobStatus::is_terminal);

        match &self.build_status {
            _ if (has_status || has_build_number) && !terminal => PollDisposition::Continue,
            Some(status) if status.is_success() => PollDisposition::Succeeded,
            Some(status) if terminal => PollDisposition::Failed(status.clone()),
            _ => PollDisposition::Abandoned,
        }
    }
}

/// Statuses that are not strings are kept by their JSON text when present,
/// so they keep polling like any unrecognized status.
fn status_from_value<'de, D>(deserializer: D) -> Result<Option<JobStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(raw) => Some(JobStatus::from(raw)),
        other if is_present(&other) => Some(JobStatus::Other(other.to_string())),
        _ => None,
    })
}

/// Empty strings, zero, `false` and `null` count as absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Body returned by publish and unpublish submissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSubmission {
    #[serde(default)]
    pub build_id: Option<BuildId>,
}

/// Location of the scheduler build tracking a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildId {
    #[serde(default)]
    pub location: Option<String>,
}

impl PublishSubmission {
    /// Non-empty build location, if the scheduler returned one.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.build_id.as_ref().and_then(|b| b.location.as_deref()).filter(|l| !l.is_empty())
    }

    /// Turn the submission into a handle for `action`.
    #[must_use]
    pub fn into_handle(self, action: JobAction) -> Option<JobHandle> {
        self.location().map(|location| JobHandle::new(location, action))
    }
}
