//! Application configuration
//!
//! `AppConfig` carries process-level settings from the command line;
//! `FaultlineConfig` is the TOML file describing the pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::analysis::WorkerConfig;
use crate::error::{Error, Result};
use crate::storage::{QueueConfig, StorageConfig};

/// Environment variable naming a config file when none is passed explicitly
pub const CONFIG_ENV_VAR: &str = "FAULTLINE_CONFIG";

/// Application configuration structure
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Verbosity level for logging
    pub verbose: u8,
    /// Explicit pipeline configuration file
    pub config_path: Option<PathBuf>,
}

impl AppConfig {
    /// Create a new application configuration
    pub fn new(verbose: u8) -> Self {
        Self {
            verbose,
            config_path: None,
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Get the log level string based on verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            2 => "trace",
            _ => "trace,hyper=debug,tower=debug",
        }
    }
}

/// Pipeline configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultlineConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

impl FaultlineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Explicit path, then `FAULTLINE_CONFIG`, then defaults
    pub async fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path).await;
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&path)).await;
        }
        debug!("No configuration file given, using defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        self.storage
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        self.queue
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        if self.worker.analysis_timeout == Duration::ZERO {
            return Err(Error::Config(
                "worker.analysis_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::OverflowPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_ladder() {
        assert_eq!(AppConfig::new(0).log_level(), "info");
        assert_eq!(AppConfig::new(1).log_level(), "debug");
        assert_eq!(AppConfig::new(2).log_level(), "trace");
        assert_eq!(
            AppConfig::new(5).log_level(),
            "trace,hyper=debug,tower=debug"
        );
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = FaultlineConfig::from_toml_str("").unwrap();
        assert_eq!(config, FaultlineConfig::default());
    }

    #[test]
    fn test_full_config() {
        let config = FaultlineConfig::from_toml_str(
            r#"
[storage]
shards = 4

[queue]
capacity = 256
overflow = "block"

[worker]
analysis_timeout = "1m 30s"
"#,
        )
        .unwrap();

        assert_eq!(config.storage.shards, 4);
        assert_eq!(config.queue, QueueConfig::bounded(256, OverflowPolicy::Block));
        assert_eq!(config.worker.analysis_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = FaultlineConfig::from_toml_str("[storage]\nshards = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = FaultlineConfig::from_toml_str("[worker]\nanalysis_timeout = \"0s\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = FaultlineConfig::from_toml_str("[queue]\noverflow = \"drop\"").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[queue]\ncapacity = 8").unwrap();

        let config = FaultlineConfig::resolve(Some(file.path())).await.unwrap();
        assert_eq!(config.queue.capacity, Some(8));
        assert_eq!(config.queue.overflow, OverflowPolicy::Reject);
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let err = FaultlineConfig::load(Path::new("/nonexistent/faultline.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("/nonexistent/faultline.toml")));
    }
}
