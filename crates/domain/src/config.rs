//! Configuration structures
//!
//! Loaded by `modelhub-infra::config`; every section has serde defaults so a
//! partial file only needs to name what differs.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_REFRESH_BACKEND_TAG,
};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    /// Job scheduler base URLs keyed by normalized region (e.g. `US_EAST`).
    #[serde(default)]
    pub job_scheduler: BTreeMap<String, String>,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Addresses of the console backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API backend; also serves the credential refresh endpoint.
    pub base_url: String,
    /// Data backend serving published model listings.
    pub data_url: String,
    /// External login page used when the refresh token is rejected.
    pub redirect_uri: String,
    /// Value of the `type` query parameter sent with refresh calls.
    #[serde(default = "default_refresh_tag")]
    pub refresh_backend_tag: String,
    /// Prefix of the address a productionized model is served from.
    #[serde(default)]
    pub static_proxy_target: Option<String>,
}

/// Job poller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    pub interval_ms: u64,
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self { interval_ms: DEFAULT_POLL_INTERVAL_MS }
    }
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS, user_agent: None }
    }
}

/// Local key/value store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: "modelhub-store.json".to_string() }
    }
}

fn default_refresh_tag() -> String {
    DEFAULT_REFRESH_BACKEND_TAG.to_string()
}
