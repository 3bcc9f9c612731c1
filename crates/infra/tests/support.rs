//! Shared fixtures for the infra integration tests

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use modelhub_common::storage::{keys, FileStore, LocalStore};
use modelhub_domain::{ApiConfig, Config, HttpConfig, PollerConfig, StorageConfig};
use modelhub_infra::{Backends, RecordingNavigator, RegistryCommands};
use tempfile::TempDir;
use wiremock::MockServer;

pub const LOGIN_PAGE: &str = "https://login.example.com/";
pub const REGION: &str = "US_EAST";

/// Mock backends behind one wiremock server plus an on-disk store.
pub struct Console {
    pub server: MockServer,
    pub store: Arc<FileStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub commands: RegistryCommands,
    _dir: TempDir,
}

impl Console {
    /// Start the server and sign in with `access_token`/`refresh_token`.
    pub async fn start(access_token: &str, refresh_token: Option<&str>) -> Self {
        init_test_tracing();
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store_path = dir.path().join("store.json");

        let store = Arc::new(FileStore::new(&store_path));
        store.set_item(keys::ACCESS_TOKEN, access_token).expect("seed access token");
        if let Some(refresh) = refresh_token {
            store.set_item(keys::REFRESH_TOKEN, refresh).expect("seed refresh token");
        }
        store.set_item(keys::REGION, "us east").expect("seed region");
        store.set_item(keys::DISPLAY_PROJECT_ID, "proj-9").expect("seed project");

        let navigator = Arc::new(RecordingNavigator::new());
        let config = config_for(&server.uri(), &store_path);
        let backends =
            Backends::from_config(&config, store.clone(), navigator.clone()).expect("backends");
        let commands = RegistryCommands::new(Arc::new(backends));

        Self { server, store, navigator, commands, _dir: dir }
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.store.get_item(key).expect("store readable")
    }
}

/// Configuration pointing every backend at `root`.
pub fn config_for(root: &str, store_path: &Path) -> Config {
    let mut job_scheduler = BTreeMap::new();
    job_scheduler.insert(REGION.to_string(), format!("{root}/scheduler/"));

    Config {
        api: ApiConfig {
            base_url: format!("{root}/api/"),
            data_url: format!("{root}/data/"),
            redirect_uri: LOGIN_PAGE.to_string(),
            refresh_backend_tag: "imax".to_string(),
            static_proxy_target: None,
        },
        job_scheduler,
        poller: PollerConfig { interval_ms: 20 },
        http: HttpConfig::default(),
        storage: StorageConfig { path: store_path.display().to_string() },
    }
}

/// Route client logs to the test harness; repeated calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("modelhub_infra=debug,modelhub_common=debug"))
        .with_test_writer()
        .try_init();
}
