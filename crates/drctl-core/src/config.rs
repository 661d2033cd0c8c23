//! Configuration resolution for drctl.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`$XDG_CONFIG_HOME/drctl/settings.json`)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables (`DRCTL_*`)
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete drctl configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// gRPC server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Per-request deadline; in-flight work is abandoned once it elapses.
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 50051)),
            request_timeout_secs: 30,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// Relational store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` file; falls back to [`database_path`] when unset.
    pub path: Option<PathBuf>,
}

/// Object-store (`MinIO`) configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Prefix of every job bucket name (`{prefix}-{uuid}`).
    pub bucket_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9000".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            region: "us-east-1".to_string(),
            bucket_prefix: "drctl".to_string(),
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("bucket_prefix", &self.bucket_prefix)
            .finish()
    }
}

/// Load configuration with hierarchical resolution.
///
/// `explicit` is a config file passed on the command line; unlike the global
/// file it must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let global = global_config_path().filter(|p| p.exists());
    load_layers(global.as_deref(), explicit, |key| std::env::var(key).ok())
}

/// Resolve defaults, then the `global` and `explicit` files, then the
/// environment. Files are merged key by key, so a layer only overrides the
/// fields it actually sets.
fn load_layers(
    global: Option<&Path>,
    explicit: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let mut merged = serde_json::to_value(Config::default())
        .map_err(|e| Error::Config(format!("Failed to encode default config: {e}")))?;

    for path in global.into_iter().chain(explicit) {
        merge_json(&mut merged, load_config_file(path)?);
    }

    let mut config: Config = serde_json::from_value(merged)
        .map_err(|e| Error::Config(format!("Invalid merged config: {e}")))?;
    apply_env_overrides(&mut config, lookup);

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("drctl").join("settings.json"))
}

/// Get the default database path for the server.
pub fn database_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("drctl").join("drctl.db"))
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
}

/// Read one config layer as raw JSON, rejecting files that are not a
/// valid (possibly partial) [`Config`].
fn load_config_file(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let parse_err =
        |e: serde_json::Error| Error::Config(format!("Failed to parse config file {}: {}", path.display(), e));

    let value: serde_json::Value = serde_json::from_str(&content).map_err(parse_err)?;
    serde_json::from_value::<Config>(value.clone()).map_err(parse_err)?;
    Ok(value)
}

/// Merge `overlay` into `base`. Objects merge recursively; any other value
/// replaces the lower one, except that an empty string (such as blank
/// credentials) keeps it.
fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
    use serde_json::Value;

    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (_, Value::String(s)) if s.is_empty() => {}
        (slot, value) => *slot = value,
    }
}

/// Apply `DRCTL_*` overrides, reading variables through `lookup`.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(addr) = lookup("DRCTL_LISTEN_ADDR").and_then(|v| v.parse().ok()) {
        config.server.listen_addr = addr;
    }
    if let Some(secs) = lookup("DRCTL_REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.server.request_timeout_secs = secs;
    }
    if let Some(level) = lookup("DRCTL_LOG_LEVEL") {
        config.server.log_level = level;
    }
    if let Some(path) = lookup("DRCTL_DB_PATH") {
        config.database.path = Some(PathBuf::from(path));
    }
    if let Some(endpoint) = lookup("DRCTL_STORAGE_ENDPOINT") {
        config.storage.endpoint = endpoint;
    }
    if let Some(key) = lookup("DRCTL_STORAGE_ACCESS_KEY") {
        config.storage.access_key = key;
    }
    if let Some(secret) = lookup("DRCTL_STORAGE_SECRET_KEY") {
        config.storage.secret_key = secret;
    }
    if let Some(region) = lookup("DRCTL_STORAGE_REGION") {
        config.storage.region = region;
    }
    if let Some(prefix) = lookup("DRCTL_BUCKET_PREFIX") {
        config.storage.bucket_prefix = prefix;
    }
}
