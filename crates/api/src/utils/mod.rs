//! Utility modules for the application shell

pub mod command_helpers;
pub mod logging;
