//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `MODELHUB_API_URL`: API backend base URL (required)
//! - `MODELHUB_DATA_URL`: Data backend base URL (required)
//! - `MODELHUB_REDIRECT_URI`: Login page used after a rejected refresh (required)
//! - `MODELHUB_JOB_SCHEDULER_<REGION>`: Job scheduler base URL per region
//! - `MODELHUB_REFRESH_TAG`: `type` parameter of refresh calls
//! - `MODELHUB_POLL_INTERVAL_MS`: Job poll interval in milliseconds
//! - `MODELHUB_HTTP_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `MODELHUB_STORE_PATH`: Local store file
//! - `MODELHUB_STATIC_PROXY_TARGET`: Prefix of hosted model URLs
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./modelhub.json` or `./modelhub.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use modelhub_domain::constants::DEFAULT_REFRESH_BACKEND_TAG;
use modelhub_domain::{
    ApiConfig, Config, HttpConfig, ModelHubError, PollerConfig, Result, StorageConfig,
};

const JOB_SCHEDULER_PREFIX: &str = "MODELHUB_JOB_SCHEDULER_";

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ModelHubError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The three backend addresses must be present; everything else falls back
/// to its default.
///
/// # Errors
/// Returns `ModelHubError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var("MODELHUB_API_URL")?;
    let data_url = env_var("MODELHUB_DATA_URL")?;
    let redirect_uri = env_var("MODELHUB_REDIRECT_URI")?;
    let refresh_backend_tag = std::env::var("MODELHUB_REFRESH_TAG")
        .unwrap_or_else(|_| DEFAULT_REFRESH_BACKEND_TAG.to_string());
    let static_proxy_target = std::env::var("MODELHUB_STATIC_PROXY_TARGET").ok();

    let mut poller = PollerConfig::default();
    if let Some(interval) = env_parse::<u64>("MODELHUB_POLL_INTERVAL_MS", "poll interval")? {
        poller.interval_ms = interval;
    }

    let mut http = HttpConfig::default();
    if let Some(timeout) = env_parse::<u64>("MODELHUB_HTTP_TIMEOUT_SECS", "HTTP timeout")? {
        http.timeout_secs = timeout;
    }

    let mut storage = StorageConfig::default();
    if let Ok(path) = std::env::var("MODELHUB_STORE_PATH") {
        storage.path = path;
    }

    Ok(Config {
        api: ApiConfig {
            base_url,
            data_url,
            redirect_uri,
            refresh_backend_tag,
            static_proxy_target,
        },
        job_scheduler: job_schedulers_from_env(),
        poller,
        http,
        storage,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `ModelHubError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ModelHubError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ModelHubError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ModelHubError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `ModelHubError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ModelHubError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ModelHubError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ModelHubError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(config_candidates(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(config_candidates(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn config_candidates(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("modelhub.json"),
        dir.join("modelhub.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
    ]
}

/// Collect `MODELHUB_JOB_SCHEDULER_<REGION>` variables, keyed by region.
fn job_schedulers_from_env() -> BTreeMap<String, String> {
    std::env::vars()
        .filter_map(|(key, value)| {
            let region = key.strip_prefix(JOB_SCHEDULER_PREFIX)?;
            (!region.is_empty() && !value.is_empty()).then(|| (region.to_uppercase(), value))
        })
        .collect()
}

/// Get required environment variable
///
/// # Errors
/// Returns `ModelHubError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ModelHubError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns `ModelHubError::Config` if the variable is set but unparsable.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ModelHubError::Config(format!("Invalid {}: {}", what, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 9] = [
        "MODELHUB_API_URL",
        "MODELHUB_DATA_URL",
        "MODELHUB_REDIRECT_URI",
        "MODELHUB_REFRESH_TAG",
        "MODELHUB_POLL_INTERVAL_MS",
        "MODELHUB_HTTP_TIMEOUT_SECS",
        "MODELHUB_STORE_PATH",
        "MODELHUB_STATIC_PROXY_TARGET",
        "MODELHUB_JOB_SCHEDULER_US_EAST",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("MODELHUB_API_URL", "https://api.example.com/");
        std::env::set_var("MODELHUB_DATA_URL", "https://data.example.com/");
        std::env::set_var("MODELHUB_REDIRECT_URI", "https://login.example.com");
        std::env::set_var("MODELHUB_REFRESH_TAG", "console");
        std::env::set_var("MODELHUB_POLL_INTERVAL_MS", "250");
        std::env::set_var("MODELHUB_HTTP_TIMEOUT_SECS", "7");
        std::env::set_var("MODELHUB_STORE_PATH", "/tmp/modelhub-test.json");
        std::env::set_var("MODELHUB_STATIC_PROXY_TARGET", "https://models.example.com/");
        std::env::set_var("MODELHUB_JOB_SCHEDULER_US_EAST", "https://use.example.com/");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.api.base_url, "https://api.example.com/");
        assert_eq!(config.api.refresh_backend_tag, "console");
        assert_eq!(config.poller.interval_ms, 250);
        assert_eq!(config.http.timeout_secs, 7);
        assert_eq!(config.storage.path, "/tmp/modelhub-test.json");
        assert_eq!(
            config.api.static_proxy_target.as_deref(),
            Some("https://models.example.com/")
        );
        assert_eq!(
            config.job_scheduler.get("US_EAST").map(String::as_str),
            Some("https://use.example.com/")
        );
    }

    #[test]
    fn test_load_from_env_defaults_optional_vars() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("MODELHUB_API_URL", "https://api.example.com/");
        std::env::set_var("MODELHUB_DATA_URL", "https://data.example.com/");
        std::env::set_var("MODELHUB_REDIRECT_URI", "https://login.example.com");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.api.refresh_backend_tag, "imax");
        assert_eq!(config.poller.interval_ms, 5000);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.api.static_proxy_target, None);
    }

    #[test]
    fn test_load_from_env_missing_required() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ModelHubError::Config(ref m) if m.contains("MODELHUB_API_URL")));
    }

    #[test]
    fn test_load_from_env_invalid_interval() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("MODELHUB_API_URL", "https://api.example.com/");
        std::env::set_var("MODELHUB_DATA_URL", "https://data.example.com/");
        std::env::set_var("MODELHUB_REDIRECT_URI", "https://login.example.com");
        std::env::set_var("MODELHUB_POLL_INTERVAL_MS", "soon");

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(ModelHubError::Config(ref m)) if m.contains("poll interval")));
    }

    #[test]
    fn test_parse_toml_config() {
        let contents = r#"
[api]
base_url = "https://api.example.com/"
data_url = "https://data.example.com/"
redirect_uri = "https://login.example.com"

[job_scheduler]
US_EAST = "https://use.example.com/"

[poller]
interval_ms = 1000
"#;
        let config = parse_config(contents, Path::new("modelhub.toml")).unwrap();
        assert_eq!(config.poller.interval_ms, 1000);
        assert_eq!(config.job_scheduler.len(), 1);
        assert_eq!(config.api.refresh_backend_tag, "imax");
    }

    #[test]
    fn test_parse_rejects_unknown_extension() {
        let err = parse_config("", Path::new("config.yaml")).unwrap_err();
        assert!(matches!(err, ModelHubError::Config(ref m) if m.contains("yaml")));
    }

    #[test]
    fn test_load_from_file_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"api": {{"base_url": "https://a/", "data_url": "https://d/", "redirect_uri": "https://l"}}}}"#
        )
        .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.api.data_url, "https://d/");
    }

    #[test]
    fn test_load_from_missing_file() {
        let file = NamedTempFile::new().unwrap();
        let missing = file.path().with_extension("missing.json");
        assert!(load_from_file(Some(missing)).is_err());
    }
}
