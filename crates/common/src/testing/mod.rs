//! Testing utilities and helpers
//!
//! - **[`mocks`]**: Mock implementations of the refresh client and store

pub mod mocks;

pub use mocks::{FailingStore, MockRefreshClient};
