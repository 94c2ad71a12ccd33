//! Configuration for the points service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Points service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// HTTP listen address
    pub http_listen_addr: String,

    /// Account actor mailbox capacity
    pub mailbox_capacity: usize,

    /// JSON file of transactions used to seed the account at startup
    pub seed_path: Option<PathBuf>,

    /// Emit logs as JSON
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "points-manager".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            http_listen_addr: "0.0.0.0:8080".to_string(),
            mailbox_capacity: 1000,
            seed_path: None,
            log_json: false,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(addr) = std::env::var("POINTS_HTTP_ADDR") {
            config.http_listen_addr = addr;
        }

        if let Ok(path) = std::env::var("POINTS_SEED_PATH") {
            config.seed_path = Some(PathBuf::from(path));
        }

        if let Ok(capacity) = std::env::var("POINTS_MAILBOX_CAPACITY") {
            config.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid POINTS_MAILBOX_CAPACITY '{}': {}", capacity, e))
            })?;
        }

        if let Ok(flag) = std::env::var("POINTS_LOG_JSON") {
            config.log_json = flag.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid POINTS_LOG_JSON '{}': {}", flag, e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runtime cannot honour
    pub fn validate(&self) -> crate::Result<()> {
        // tokio::sync::mpsc::channel panics on zero capacity
        if self.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "mailbox_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "points-manager");
        assert_eq!(config.http_listen_addr, "0.0.0.0:8080");
        assert_eq!(config.mailbox_capacity, 1000);
        assert!(config.seed_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "http_listen_addr = \"127.0.0.1:9000\"").unwrap();
        writeln!(file, "seed_path = \"/tmp/seed.json\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.http_listen_addr, "127.0.0.1:9000");
        assert_eq!(config.seed_path, Some(PathBuf::from("/tmp/seed.json")));
        assert_eq!(config.mailbox_capacity, 1000);
    }

    #[test]
    fn test_from_file_rejects_zero_mailbox() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mailbox_capacity = 0").unwrap();

        assert!(matches!(
            Config::from_file(file.path()),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mailbox_capacity = \"lots\"").unwrap();

        assert!(Config::from_file(file.path()).is_err());
    }
}
