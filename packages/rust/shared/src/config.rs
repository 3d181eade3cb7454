//! Application configuration for Paperdesk.
//!
//! User config lives at `~/.paperdesk/paperdesk.toml`.
//! CLI flags override config file values, which override defaults.
//! Access tokens are never stored in the file, only the names of the
//! environment variables that hold them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PaperdeskError, Result};
use crate::types::clamp_limit;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "paperdesk.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".paperdesk";

// ---------------------------------------------------------------------------
// Config structs (matching paperdesk.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document metadata and search API.
    #[serde(default)]
    pub api: ApiConfig,

    /// Remote blob store.
    #[serde(default)]
    pub blob: BlobConfig,

    /// Upload behavior.
    #[serde(default)]
    pub upload: UploadConfig,

    /// Search defaults.
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the bearer token.
    #[serde(default = "default_api_token_env")]
    pub token_env: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: default_api_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".into()
}
fn default_api_token_env() -> String {
    "PAPERDESK_API_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[blob]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Upload endpoint of the remote store.
    #[serde(default = "default_blob_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the read-write token.
    #[serde(default = "default_blob_token_env")]
    pub token_env: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            endpoint: default_blob_endpoint(),
            token_env: default_blob_token_env(),
        }
    }
}

fn default_blob_endpoint() -> String {
    "https://blob.vercel-storage.com".into()
}
fn default_blob_token_env() -> String {
    "BLOB_READ_WRITE_TOKEN".into()
}

/// `[upload]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// How long a completed upload keeps showing 100% before resetting.
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            reset_delay_ms: default_reset_delay_ms(),
        }
    }
}

impl UploadConfig {
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}

fn default_reset_delay_ms() -> u64 {
    1000
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result count used when the caller does not pick one.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

impl SearchConfig {
    /// The configured default, clamped into the accepted range.
    pub fn effective_limit(&self) -> u32 {
        clamp_limit(self.default_limit)
    }
}

fn default_limit() -> u32 {
    5
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Check URLs and numeric bounds.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api.base_url).map_err(|e| {
            PaperdeskError::config(format!("api.base_url '{}' is invalid: {e}", self.api.base_url))
        })?;
        Url::parse(&self.blob.endpoint).map_err(|e| {
            PaperdeskError::config(format!("blob.endpoint '{}' is invalid: {e}", self.blob.endpoint))
        })?;
        if self.api.timeout_secs == 0 {
            return Err(PaperdeskError::config("api.timeout_secs must be > 0"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.paperdesk/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PaperdeskError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.paperdesk/paperdesk.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PaperdeskError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        PaperdeskError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PaperdeskError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PaperdeskError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PaperdeskError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read an access token from the named environment variable.
pub fn resolve_token(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(PaperdeskError::config(format!(
            "access token not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Read the blob store token; its absence means uploads cannot run at all.
pub fn resolve_blob_token(config: &AppConfig) -> Result<String> {
    resolve_token(&config.blob.token_env).map_err(|_| {
        PaperdeskError::config(format!(
            "Upload service is not configured (set {})",
            config.blob.token_env
        ))
    })
}
