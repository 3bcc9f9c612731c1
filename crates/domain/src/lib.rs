//! # ModelHub Domain
//!
//! Business domain types and models for the ModelHub registry console.
//!
//! This crate contains:
//! - Job types (actions, handles, statuses, status reports)
//! - Registry payloads (publish requests, published models, model versions)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other ModelHub crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
