use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level application configuration.
/// Loaded from an optional `apkd.toml` and environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Download storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Remote store gateway settings
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,
    /// HTTP port (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory where downloaded packages are written (default: ./Downloads)
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store gateway
    #[serde(default = "default_store_base_url")]
    pub base_url: String,
    /// Optional bearer token sent with every store session
    #[serde(default)]
    pub token: Option<String>,
    /// Per-request timeout in seconds (default: 300)
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Load config from `apkd.toml` (if present) and `APKD__*` environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Path::new("apkd"))
    }

    /// Load config using `file_stem` as the optional config file base name.
    pub fn load_from(file_stem: &Path) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(file_stem).required(false))
            .add_source(
                config::Environment::default()
                    .prefix("APKD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        cfg.try_deserialize()
    }
}

impl StorageConfig {
    /// Returns the download root as an absolute path.
    ///
    /// Relative paths are resolved against the current working directory once,
    /// at startup, so every request sees the same root.
    pub fn absolute_download_dir(&self) -> std::io::Result<PathBuf> {
        if self.download_dir.is_absolute() {
            Ok(self.download_dir.clone())
        } else {
            Ok(std::env::current_dir()?.join(&self.download_dir))
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_store_base_url(),
            token: None,
            timeout_secs: default_store_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_download_dir() -> PathBuf {
    PathBuf::from("./Downloads")
}
fn default_store_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_store_timeout() -> u64 {
    300
}
