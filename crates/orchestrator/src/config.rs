//! Orchestrator configuration
//!
//! Loaded from the `[orchestrator]` table of a TOML file:
//!
//! ```toml
//! [orchestrator]
//! completion_timeout_ms = 5000
//! abort_on_contract_violation = false
//! worker_thread_name = "navtree-orchestrator"
//! main_thread_name = "navtree-main"
//! ```

use crate::error::OrchestratorError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_COMPLETION_TIMEOUT_MS: u64 = 5_000;
pub const MIN_COMPLETION_TIMEOUT_MS: u64 = 1;
pub const MAX_COMPLETION_TIMEOUT_MS: u64 = 600_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// How long a view may take to signal completion (default: 5s)
    pub completion_timeout_ms: u64,

    /// Abort the process on a contract violation instead of only failing
    /// the orchestrator
    pub abort_on_contract_violation: bool,

    /// Name of the thread that executes transitions
    pub worker_thread_name: String,

    /// Name of the thread spawned by `MainQueue`
    pub main_thread_name: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            completion_timeout_ms: DEFAULT_COMPLETION_TIMEOUT_MS,
            abort_on_contract_violation: false,
            worker_thread_name: "navtree-orchestrator".to_string(),
            main_thread_name: "navtree-main".to_string(),
        }
    }
}

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    orchestrator: OrchestratorConfig,
}

impl OrchestratorConfig {
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }

    /// Set the timeout, rounded up to whole milliseconds
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.completion_timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// Check value ranges
    ///
    /// - completion_timeout_ms: 1-600,000
    /// - thread names: non-empty
    pub fn validate(&self) -> std::result::Result<(), OrchestratorError> {
        if !(MIN_COMPLETION_TIMEOUT_MS..=MAX_COMPLETION_TIMEOUT_MS).contains(&self.completion_timeout_ms) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "completion_timeout_ms must be between {} and {}, got {}",
                MIN_COMPLETION_TIMEOUT_MS, MAX_COMPLETION_TIMEOUT_MS, self.completion_timeout_ms
            )));
        }
        if self.worker_thread_name.is_empty() || self.main_thread_name.is_empty() {
            return Err(OrchestratorError::InvalidConfig(
                "thread names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).context("Failed to parse configuration")?;
        file.orchestrator.validate()?;
        Ok(file.orchestrator)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Render in the on-disk layout
    pub fn to_toml_string(&self) -> Result<String> {
        let file = ConfigFile {
            orchestrator: self.clone(),
        };
        toml::to_string_pretty(&file).context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.completion_timeout(), Duration::from_secs(5));
        assert!(!config.abort_on_contract_violation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = OrchestratorConfig::from_toml_str("[orchestrator]\ncompletion_timeout_ms = 250\n").unwrap();
        assert_eq!(config.completion_timeout(), Duration::from_millis(250));
        assert_eq!(config.worker_thread_name, "navtree-orchestrator");

        let empty = OrchestratorConfig::from_toml_str("").unwrap();
        assert_eq!(empty, OrchestratorConfig::default());
    }

    #[test]
    fn test_out_of_range_timeout_is_rejected() {
        assert!(OrchestratorConfig::from_toml_str("[orchestrator]\ncompletion_timeout_ms = 0\n").is_err());
        let config = OrchestratorConfig {
            completion_timeout_ms: MAX_COMPLETION_TIMEOUT_MS + 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(OrchestratorError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("navtree.toml");

        let config = OrchestratorConfig {
            abort_on_contract_violation: true,
            ..Default::default()
        }
        .with_completion_timeout(Duration::from_millis(1500));
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = OrchestratorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_sub_millisecond_timeout_rounds_up() {
        let config = OrchestratorConfig::default().with_completion_timeout(Duration::from_micros(200));
        assert_eq!(config.completion_timeout_ms, 1);
        assert!(config.validate().is_ok());

        let config = OrchestratorConfig::default().with_completion_timeout(Duration::from_micros(1500));
        assert_eq!(config.completion_timeout_ms, 2);

        let config = OrchestratorConfig::default().with_completion_timeout(Duration::MAX);
        assert_eq!(config.completion_timeout_ms, u64::MAX);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = OrchestratorConfig::load(&temp_dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
