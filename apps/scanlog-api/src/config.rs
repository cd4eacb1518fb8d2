//! API service configuration.
//!
//! Layered with the `config` crate, later sources winning:
//!
//! ```text
//! built-in defaults ──► scanlog-api.toml (optional) ──► SCANLOG_API_* env
//! ```
//!
//! e.g. `SCANLOG_API_PORT=8080`, `SCANLOG_API_DATABASE_PATH=:memory:`.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Default configuration file stem, resolved against the working directory.
pub const CONFIG_FILE: &str = "scanlog-api";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SCANLOG_API";

/// API service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to listen on
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// SQLite file backing the `codes` table, or `:memory:`
    pub database_path: String,

    /// Pool size for file databases
    pub max_connections: u32,

    /// Path the `codigos` collection is served under
    pub mount_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
            database_path: "scanlog.db".to_string(),
            max_connections: 5,
            mount_path: "/codigos".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from defaults, `scanlog-api.toml` and the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Same as [`ApiConfig::load`] with an explicit configuration file, which
    /// then must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(CONFIG_FILE).required(false),
        };

        let config: ApiConfig = defaults()?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text layered over the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: ApiConfig = defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values the type system can't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "bind_addr".to_string(),
                reason: e.to_string(),
            })?;

        if self.database_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database_path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_connections".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if !self.mount_path.starts_with('/')
            || self.mount_path.len() < 2
            || self.mount_path.ends_with('/')
        {
            return Err(ConfigError::InvalidValue {
                field: "mount_path".to_string(),
                reason: "must look like /name with no trailing slash".to_string(),
            });
        }

        Ok(())
    }

    /// Address to bind the listener to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .bind_addr
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "bind_addr".to_string(),
                reason: e.to_string(),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let d = ApiConfig::default();
    let builder = Config::builder()
        .set_default("bind_addr", d.bind_addr)?
        .set_default("port", i64::from(d.port))?
        .set_default("database_path", d.database_path)?
        .set_default("max_connections", i64::from(d.max_connections))?
        .set_default("mount_path", d.mount_path)?;
    Ok(builder)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_toml_str("").unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_toml_overrides() {
        let config = ApiConfig::from_toml_str(
            r#"
            port = 8080
            database_path = ":memory:"
            mount_path = "/codes"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_path, ":memory:");
        assert_eq!(config.mount_path, "/codes");
        assert_eq!(config.bind_addr, "0.0.0.0");
    }

    #[test]
    fn test_validation() {
        let bad_mount = ApiConfig {
            mount_path: "/codigos/".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            bad_mount.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "mount_path"
        ));

        let bad_addr = ApiConfig {
            bind_addr: "localhost".to_string(),
            ..ApiConfig::default()
        };
        assert!(bad_addr.validate().is_err());

        let no_pool = ApiConfig {
            max_connections: 0,
            ..ApiConfig::default()
        };
        assert!(no_pool.validate().is_err());
    }
}
