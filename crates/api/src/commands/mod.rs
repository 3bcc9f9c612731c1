//! Commands - argument parser to client bridge

mod jobs;
mod productionize;
mod published;
mod session;

pub use jobs::*;
pub use productionize::*;
pub use published::*;
pub use session::*;
