//! Domain data types

pub mod job;
pub mod registry;

pub use job::{
    BuildId, JobAction, JobHandle, JobStatus, JobStatusReport, PollDisposition, PublishSubmission,
};
pub use registry::{
    mark_published, ModelVersion, ModelVersionRow, PublishModelRequest, PublishedModel,
};
