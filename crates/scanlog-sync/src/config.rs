//! # Client Configuration
//!
//! Configuration for a scanning device.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SCANLOG_API_URL=http://10.0.0.5:3000/codigos                       │
//! │     SCANLOG_LOCAL_DB=/data/scans.db                                    │
//! │     SCANLOG_LOCAL_ENABLED=false                                        │
//! │     SCANLOG_TYPE_FILTER=qr                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/scanlog/client.toml (Linux)                              │
//! │     ~/Library/Application Support/com.scanlog.scanlog/client.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "http://127.0.0.1:3000/codigos"
//! timeout_secs = 10
//! type_filter = "qr"     # optional
//!
//! [local]
//! enabled = true
//! path = "scanlog-local.db"
//! mirror_scans = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use scanlog_db::LocalStoreConfig;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Remote Store Settings
// =============================================================================

/// `[api]` section: where the remote store lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// URL of the `codigos` collection.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Only show codes of this type in the view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_filter: Option<String>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000/codigos".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            type_filter: None,
        }
    }
}

impl ApiSettings {
    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Local Store Settings
// =============================================================================

/// `[local]` section: the device store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSettings {
    /// Use the device store where the platform supports it.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// SQLite file for the device store.
    #[serde(default = "default_local_path")]
    pub path: PathBuf,

    /// Write every scan to the device store as well as the remote one.
    #[serde(default = "default_true")]
    pub mirror_scans: bool,
}

fn default_true() -> bool {
    true
}

fn default_local_path() -> PathBuf {
    LocalStoreConfig::default().path
}

impl Default for LocalSettings {
    fn default() -> Self {
        LocalSettings {
            enabled: true,
            path: default_local_path(),
            mirror_scans: true,
        }
    }
}

impl LocalSettings {
    /// Settings understood by `scanlog_db::open_local_store`.
    pub fn store_config(&self) -> LocalStoreConfig {
        LocalStoreConfig {
            enabled: self.enabled,
            path: self.path.clone(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Remote store settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Device store settings.
    #[serde(default)]
    pub local: LocalSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> SyncResult<Self> {
        let config: ClientConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        self.collection_url()?;

        if self.api.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.local.enabled && self.local.path.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig(
                "local.path must be set when the local store is enabled".into(),
            ));
        }

        Ok(())
    }

    /// Parsed collection URL; must be http(s).
    pub fn collection_url(&self) -> SyncResult<Url> {
        let url = Url::parse(&self.api.base_url)?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(SyncError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if url.cannot_be_a_base() {
            return Err(SyncError::InvalidUrl(format!(
                "API URL cannot carry a path: {}",
                self.api.base_url
            )));
        }

        Ok(url)
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SCANLOG_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(path) = std::env::var("SCANLOG_LOCAL_DB") {
            debug!(path = %path, "Overriding local store path from environment");
            self.local.path = PathBuf::from(path);
        }

        if let Ok(enabled) = std::env::var("SCANLOG_LOCAL_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.local.enabled = true,
                "0" | "false" | "no" | "off" => self.local.enabled = false,
                _ => warn!(value = %enabled, "Unrecognized SCANLOG_LOCAL_ENABLED value"),
            }
        }

        if let Ok(filter) = std::env::var("SCANLOG_TYPE_FILTER") {
            self.api.type_filter = if filter.is_empty() { None } else { Some(filter) };
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "scanlog", "scanlog")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.base_url, "http://127.0.0.1:3000/codigos");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert!(config.local.enabled);
        assert!(config.local.mirror_scans);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = ClientConfig::from_toml_str(
            r#"
            [api]
            base_url = "https://scans.example.com/codigos"
            type_filter = "qr"

            [local]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.api.type_filter.as_deref(), Some("qr"));
        assert_eq!(config.api.timeout_secs, 10);
        assert!(!config.local.enabled);
        assert!(config.local.mirror_scans);
        assert!(!config.local.store_config().enabled);
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = ClientConfig::from_toml_str(
            r#"
            [api]
            base_url = "ws://127.0.0.1:3000/codigos"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::InvalidUrl(_)));

        let err = ClientConfig::from_toml_str("[api]\nbase_url = \"not a url\"").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("scanlog-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("client.toml");

        let mut config = ClientConfig::default();
        config.api.type_filter = Some("ean13".to_string());
        config.local.mirror_scans = false;
        config.save(Some(path.clone())).unwrap();

        let loaded: ClientConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
