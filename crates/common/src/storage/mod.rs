//! Persistent client-side key/value storage
//!
//! The console keeps its credentials and a handful of user selections
//! (project, region, username) as flat string pairs. [`LocalStore`] is the
//! seam; [`FileStore`] persists a JSON document on disk and [`MemoryStore`]
//! backs tests.

pub mod error;
pub mod keys;
pub mod local;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use local::{FileStore, LocalStore, MemoryStore};
