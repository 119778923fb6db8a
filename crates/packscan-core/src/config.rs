//! Application configuration loading
//!
//! Optional YAML file with file-or-default semantics: a missing file yields
//! the built-in defaults, a present but malformed file is an error. CLI
//! flags override whatever was loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ScanError;

fn default_endpoint() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the analysis endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Path of the persisted state file. Defaults to the platform data
    /// directory when absent.
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            state_path: None,
            log_level: default_log_level(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file, falling back to defaults when
    /// the file does not exist.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<AppConfig, ScanError> {
        let path = path.as_ref();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config file at {}, using defaults", path.display());
                return Ok(AppConfig::default());
            }
            Err(e) => {
                return Err(ScanError::Config(format!(
                    "Failed to read config file {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<AppConfig, ScanError> {
        serde_yaml::from_str(content)
            .map_err(|e| ScanError::Config(format!("Failed to parse YAML config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied_per_field() {
        let config = ConfigLoader::from_str("endpoint: https://scan.example.com").unwrap();
        assert_eq!(config.endpoint, "https://scan.example.com");
        assert_eq!(config.log_level, "info");
        assert!(config.state_path.is_none());
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        assert!(matches!(
            ConfigLoader::from_str(": not yaml"),
            Err(ScanError::Config(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let config = ConfigLoader::from_file("/nonexistent/packscan.yaml")
            .await
            .unwrap();
        assert_eq!(config.endpoint, default_endpoint());
    }
}
