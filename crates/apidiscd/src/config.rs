//! Daemon configuration (TOML)

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use apidisc_aggregator::ManagerConfig;
use apidisc_core::{ApiService, ServiceReference};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading the daemon configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid backend {backend}: {reason}")]
    Backend { backend: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// A remote backend served over HTTP
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendConfig {
    /// API group; empty for the core group
    #[serde(default)]
    pub group: String,
    pub version: String,
    /// Base URL of the backend's discovery endpoints
    pub url: String,
    /// Service the registration points at; defaults to `default/<version>.<group>`
    pub service: Option<ServiceReference>,
    #[serde(default)]
    pub group_priority_minimum: i32,
    #[serde(default)]
    pub version_priority: i32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl BackendConfig {
    /// Registration for this backend. Always remote.
    pub fn api_service(&self) -> ApiService {
        let service = ApiService::new(self.group.clone(), self.version.clone());
        let reference = self
            .service
            .clone()
            .unwrap_or_else(|| ServiceReference::new("default", service.name.clone()));
        service
            .with_service(reference)
            .with_priority(self.group_priority_minimum, self.version_priority)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub server: ServerConfig,
    pub manager: ManagerConfig,
    pub backends: Vec<BackendConfig>,
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for backend in &self.backends {
            let name = backend.api_service().name;
            let invalid = |reason: &str| ConfigError::Backend {
                backend: name.clone(),
                reason: reason.to_string(),
            };
            if backend.version.is_empty() {
                return Err(invalid("version must not be empty"));
            }
            if backend.url.is_empty() {
                return Err(invalid("url must not be empty"));
            }
            if backend.timeout_ms == 0 {
                return Err(invalid("timeout_ms must be positive"));
            }
            if !seen.insert(name.clone()) {
                return Err(invalid("registered twice"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    const FULL: &str = r#"
[server]
port = 9443

[manager]
workers = 4

[manager.retry]
initial_backoff_ms = 250
max_backoff_ms = 10000

[[backends]]
group = "stable.example.com"
version = "v1"
url = "http://127.0.0.1:9000"
service = { namespace = "default", name = "example" }
group_priority_minimum = 1000
version_priority = 15
timeout_ms = 5000

[[backends]]
version = "v1"
url = "http://127.0.0.1:9001"
"#;

    #[test]
    fn parses_full_config() {
        let config = DaemonConfig::from_toml(FULL).unwrap();
        assert_eq!(config.server.port, 9443);
        assert_eq!(config.manager.workers, 4);
        assert_eq!(config.manager.retry.initial_backoff_ms, 250);
        assert_eq!(config.backends.len(), 2);

        let stable = config.backends[0].api_service();
        assert_eq!(stable.name, "v1.stable.example.com");
        assert_eq!(stable.service, Some(ServiceReference::new("default", "example")));
        assert_eq!(stable.group_priority_minimum, 1000);
        assert_eq!(stable.version_priority, 15);
        assert_eq!(config.backends[0].timeout(), Duration::from_secs(5));

        let core = config.backends[1].api_service();
        assert_eq!(core.name, "v1");
        assert!(!core.is_local());
        assert_eq!(config.backends[1].timeout(), Duration::from_secs(30));
        assert_eq!(config.backends[1].connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = DaemonConfig::from_toml("").unwrap();
        assert_eq!(config, DaemonConfig::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.manager.workers, 2);
    }

    #[test]
    fn duplicate_backends_are_rejected() {
        let toml = r#"
[[backends]]
group = "g.io"
version = "v1"
url = "http://a"

[[backends]]
group = "g.io"
version = "v1"
url = "http://b"
"#;
        let err = DaemonConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Backend { ref backend, .. } if backend == "v1.g.io"));
    }

    #[test]
    fn missing_url_is_a_parse_error() {
        let err = DaemonConfig::from_toml("[[backends]]\nversion = \"v1\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = DaemonConfig::load(file.path()).unwrap();
        assert_eq!(config.backends.len(), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DaemonConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
