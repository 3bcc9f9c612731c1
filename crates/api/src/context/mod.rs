//! Application context - dependency injection container

use std::sync::Arc;

use modelhub_common::storage::{FileStore, LocalStore};
use modelhub_common::CredentialManager;
use modelhub_domain::{Config, Result};
use modelhub_infra::{Backends, JobPoller, LoggingNavigator, Navigator, RegistryCommands};
use tracing::info;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn LocalStore>,
    pub commands: RegistryCommands,
    pub poller: JobPoller,
}

impl AppContext {
    /// Build the context with a file-backed store at `config.storage.path`
    /// and terminal re-login navigation.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a backend address is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(FileStore::new(&config.storage.path));
        info!(path = %store.path().display(), "using local store");
        Self::with_parts(config, store, Arc::new(LoggingNavigator))
    }

    /// Build the context around an existing store and navigator.
    ///
    /// # Errors
    ///
    /// See [`AppContext::new`]
    pub fn with_parts(
        config: Config,
        store: Arc<dyn LocalStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let backends = Backends::from_config(&config, Arc::clone(&store), navigator)?;
        let commands = RegistryCommands::new(Arc::new(backends));
        let poller = JobPoller::new(Arc::new(commands.clone()), config.poller.interval());

        info!(
            regions = commands.backends().regions().count(),
            poll_interval_ms = config.poller.interval_ms,
            "application context ready"
        );

        Ok(Self { config, store, commands, poller })
    }

    pub fn credentials(&self) -> &CredentialManager {
        self.commands.backends().credentials()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("commands", &self.commands)
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}
