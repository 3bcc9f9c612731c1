//! Backend resolution
//!
//! The console talks to three kinds of backend: the API (token refresh),
//! the data service (published listings) and one job scheduler per region.
//! The data and scheduler clients share one [`Session`], so a refresh
//! triggered through any client is seen by every other.

use std::collections::BTreeMap;
use std::sync::Arc;

use modelhub_common::auth::{CredentialManager, RefreshClient, RefreshConfig};
use modelhub_common::storage::LocalStore;
use modelhub_domain::constants::MODULE_JOB_SCHEDULER;
use modelhub_domain::Config;
use tracing::debug;
use url::Url;

use super::auth::{AuthenticatedClient, Session};
use super::errors::ApiError;
use crate::http::HttpClient;
use crate::navigation::Navigator;

/// Normalize a user-facing region name into a scheduler table key.
///
/// Only the first space becomes an underscore (`"us east"` -> `"US_EAST"`).
pub fn normalize_region(region: &str) -> String {
    region.trim().replacen(' ', "_", 1).to_uppercase()
}

/// Clients for every configured backend
#[derive(Debug, Clone)]
pub struct Backends {
    session: Session,
    data: AuthenticatedClient,
    schedulers: BTreeMap<String, AuthenticatedClient>,
}

impl Backends {
    /// Build all clients from `config` on top of an existing session.
    ///
    /// # Errors
    ///
    /// Returns `Config` if any configured base URL is invalid
    pub fn new(config: &Config, session: Session) -> Result<Self, ApiError> {
        Url::parse(&config.api.base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL for api: {e}")))?;
        let data = AuthenticatedClient::new("data", &config.api.data_url, session.clone())?;

        let mut schedulers = BTreeMap::new();
        for (region, url) in &config.job_scheduler {
            let key = normalize_region(region);
            let client = AuthenticatedClient::new(
                format!("{MODULE_JOB_SCHEDULER}:{key}"),
                url,
                session.clone(),
            )?;
            schedulers.insert(key, client);
        }
        debug!(regions = schedulers.len(), "job scheduler backends configured");

        Ok(Self { session, data, schedulers })
    }

    /// Wire transport, refresh client and credential manager from `config`
    ///
    /// # Errors
    ///
    /// Returns `Config` if the HTTP client cannot be built or a base URL is
    /// invalid
    pub fn from_config(
        config: &Config,
        store: Arc<dyn LocalStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let mut builder = HttpClient::builder().timeout(config.http.timeout());
        if let Some(agent) = &config.http.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let http = builder.build().map_err(|e| ApiError::Config(e.to_string()))?;

        let refresh_config = RefreshConfig {
            base_url: config.api.base_url.clone(),
            backend_tag: config.api.refresh_backend_tag.clone(),
            timeout: config.http.timeout(),
        };
        let refresh = RefreshClient::with_client(http.inner().clone(), refresh_config)?;
        let credentials = CredentialManager::new(Arc::new(refresh), store);

        let session = Session::new(http, credentials, navigator, config.api.redirect_uri.clone());
        Self::new(config, session)
    }

    pub fn data(&self) -> &AuthenticatedClient {
        &self.data
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn credentials(&self) -> &CredentialManager {
        self.session.credentials()
    }

    /// Normalized names of the configured scheduler regions
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.schedulers.keys().map(String::as_str)
    }

    /// Client for `module` in `region`
    ///
    /// # Errors
    ///
    /// Returns `Config` for any module other than `job_scheduler`, or for a
    /// region with no configured address
    pub fn region_client(&self, module: &str, region: &str) -> Result<&AuthenticatedClient, ApiError> {
        if module != MODULE_JOB_SCHEDULER {
            return Err(ApiError::Config(format!("no per-region backend for module '{module}'")));
        }

        let key = normalize_region(region);
        self.schedulers.get(&key).ok_or_else(|| {
            ApiError::Config(format!("no {MODULE_JOB_SCHEDULER} address configured for region '{key}'"))
        })
    }
}

#[cfg(test)]
mod tests {
    use modelhub_common::storage::MemoryStore;
    use modelhub_domain::ApiConfig;

    use super::*;
    use crate::navigation::LoggingNavigator;

    fn config() -> Config {
        Config {
            api: ApiConfig {
                base_url: "https://api.example.com/".into(),
                data_url: "https://data.example.com/".into(),
                redirect_uri: "https://login.example.com".into(),
                refresh_backend_tag: "imax".into(),
                static_proxy_target: None,
            },
            job_scheduler: BTreeMap::from([
                ("US_EAST".to_string(), "https://use.example.com/".to_string()),
                ("eu west".to_string(), "https://euw.example.com/".to_string()),
            ]),
            poller: Default::default(),
            http: Default::default(),
            storage: Default::default(),
        }
    }

    fn backends() -> Backends {
        Backends::from_config(&config(), Arc::new(MemoryStore::new()), Arc::new(LoggingNavigator))
            .unwrap()
    }

    #[test]
    fn normalizes_first_space_only() {
        assert_eq!(normalize_region("us east"), "US_EAST");
        assert_eq!(normalize_region("ap south east"), "AP_SOUTH EAST");
        assert_eq!(normalize_region("EU_WEST"), "EU_WEST");
    }

    #[test]
    fn resolves_configured_regions() {
        let backends = backends();
        let client = backends.region_client("job_scheduler", "us east").unwrap();
        assert_eq!(client.base_url().as_str(), "https://use.example.com/");
        assert_eq!(client.name(), "job_scheduler:US_EAST");

        assert!(backends.region_client("job_scheduler", "eu west").is_ok());
        assert_eq!(backends.regions().collect::<Vec<_>>(), vec!["EU_WEST", "US_EAST"]);
    }

    #[test]
    fn rejects_unknown_module_and_region() {
        let backends = backends();
        assert!(matches!(
            backends.region_client("notebooks", "us east"),
            Err(ApiError::Config(ref m)) if m.contains("notebooks")
        ));
        assert!(matches!(
            backends.region_client("job_scheduler", "mars"),
            Err(ApiError::Config(ref m)) if m.contains("MARS")
        ));
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        for field in ["api", "data"] {
            let mut config = config();
            match field {
                "api" => config.api.base_url = "not a url".into(),
                _ => config.api.data_url = "not a url".into(),
            }
            let err =
                Backends::from_config(&config, Arc::new(MemoryStore::new()), Arc::new(LoggingNavigator))
                    .unwrap_err();
            assert_eq!(err.kind(), crate::api::ApiErrorKind::Config, "{field}");
        }
    }
}
