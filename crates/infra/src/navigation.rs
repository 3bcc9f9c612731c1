//! Re-login navigation
//!
//! When the refresh token is rejected the client sends the user back to the
//! external login page. In a terminal that means telling them where to go;
//! embedders can plug in their own [`Navigator`].

use parking_lot::Mutex;
use tracing::warn;

/// Sends the user to an external location.
pub trait Navigator: Send + Sync {
    fn redirect(&self, location: &str);
}

/// Logs the redirect target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn redirect(&self, location: &str) {
        warn!(location, "session expired; sign in again");
    }
}

/// Remembers every redirect it was asked to perform.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.visits.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, location: &str) {
        self.visits.lock().push(location.to_string());
    }
}
