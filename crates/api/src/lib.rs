//! # ModelHub App
//!
//! Command-line shell around the registry client.
//!
//! This crate contains:
//! - The `modelhub` binary and its argument parser
//! - Application context (dependency injection)
//! - Commands (login, selections, publish/unpublish, status, listings)
//!
//! ## Architecture
//! - Depends on `common`, `domain`, and `infra`
//! - Wires the store, the backends and the job poller together

pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
