//! Long-running job tracking
//!
//! [`JobPoller`] follows a submitted publish/unpublish job to a terminal
//! status; [`PublishedIndex`] is the usual success listener.

pub mod poller;
pub mod published;

pub use poller::{JobListener, JobOutcome, JobPoller, JobStatusSource, JobWatch};
pub use published::{PublishedIndex, PublishedModelSource};
