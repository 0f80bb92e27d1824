//! Application configuration loaded from an optional TOML file plus
//! environment overrides.
//!
//! ```toml
//! [server]
//! addr = "0.0.0.0:3000"
//!
//! [store]
//! catalog = "tasks.json"
//!
//! [scheduler]
//! dangling_dependencies = "ignore"
//!
//! [logging]
//! level = "info"
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::schedule::{DanglingDependencyPolicy, SchedulerOptions};

pub const ENV_HTTP_ADDR: &str = "EVENT_SCHEDULE_HTTP_ADDR";
pub const ENV_CATALOG: &str = "EVENT_SCHEDULE_CATALOG";
pub const ENV_LOG: &str = "EVENT_SCHEDULE_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub scheduler: SchedulerOptions,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_addr")]
    pub addr: String,
}

fn default_addr() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

/// Where the server's task catalogue is seeded from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub sqlite: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads `path` when given (defaults otherwise), applies environment
    /// overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&contents)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_HTTP_ADDR) {
            self.server.addr = addr;
        }
        if let Some(catalog) = lookup(ENV_CATALOG) {
            self.store.catalog = Some(PathBuf::from(catalog));
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.logging.level = Some(level);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.store.catalog.is_some() && self.store.sqlite.is_some() {
            return Err(ConfigError::Invalid(
                "[store] accepts either `catalog` or `sqlite`, not both".into(),
            ));
        }
        if self.store.sqlite.is_some() && !cfg!(feature = "sqlite") {
            return Err(ConfigError::Invalid(
                "[store].sqlite requires the `sqlite` feature".into(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.addr.parse().map_err(|_| {
            ConfigError::Invalid(format!("[server].addr '{}' is not a socket address", self.server.addr))
        })
    }

    pub fn dangling_dependencies(&self) -> DanglingDependencyPolicy {
        self.scheduler.dangling_dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:3000");
        assert_eq!(config.dangling_dependencies(), DanglingDependencyPolicy::Ignore);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_all_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            addr = "127.0.0.1:8080"

            [store]
            catalog = "tasks.json"

            [scheduler]
            dangling_dependencies = "reject"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
        assert_eq!(config.store.catalog, Some(PathBuf::from("tasks.json")));
        assert_eq!(config.dangling_dependencies(), DanglingDependencyPolicy::Reject);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            ENV_HTTP_ADDR => Some("127.0.0.1:9999".to_string()),
            ENV_LOG => Some("trace".to_string()),
            _ => None,
        });
        assert_eq!(config.server.addr, "127.0.0.1:9999");
        assert_eq!(config.logging.level.as_deref(), Some("trace"));
        assert!(config.store.catalog.is_none());
    }

    #[test]
    fn rejects_bad_address_and_conflicting_stores() {
        let mut config = AppConfig::default();
        config.server.addr = "not-an-addr".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.store.catalog = Some("a.json".into());
        config.store.sqlite = Some("a.db".into());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[scheduler]\ndangling_dependencies = \"maybe\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
