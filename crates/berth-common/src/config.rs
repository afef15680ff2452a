//! Agent configuration model.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BerthError, Result};

/// Root configuration for the agent's event tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BerthConfig {
    /// Cluster the agent is registered in.
    pub cluster: String,
    /// Path to the agent state file.
    pub state_file: PathBuf,
    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,
    /// Reason attached to events when the caller supplies none.
    pub default_reason: String,
}

impl Default for BerthConfig {
    fn default() -> Self {
        Self {
            cluster: crate::constants::DEFAULT_CLUSTER.to_owned(),
            state_file: PathBuf::from(crate::constants::DEFAULT_STATE_FILE),
            json_logs: false,
            default_reason: String::new(),
        }
    }
}

impl BerthConfig {
    /// Loads the configuration from a JSON file.
    ///
    /// A missing file yields the default configuration; keys absent from
    /// the file keep their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if the cluster name is empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| BerthError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), cluster = %config.cluster, "config loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cluster.trim().is_empty() {
            return Err(BerthError::Config {
                message: "cluster name must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = BerthConfig::load(&dir.path().join("absent.json")).expect("load");
        assert_eq!(config, BerthConfig::default());
        assert_eq!(config.cluster, "default");
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"cluster":"prod","json_logs":true}"#).expect("write");

        let config = BerthConfig::load(&path).expect("load");
        assert_eq!(config.cluster, "prod");
        assert!(config.json_logs);
        assert_eq!(
            config.state_file,
            PathBuf::from(crate::constants::DEFAULT_STATE_FILE)
        );
    }

    #[test]
    fn empty_cluster_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"cluster":"  "}"#).expect("write");

        let err = BerthConfig::load(&path).unwrap_err();
        assert!(matches!(err, BerthError::Config { .. }));
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").expect("write");

        let err = BerthConfig::load(&path).unwrap_err();
        assert!(matches!(err, BerthError::Serialization { .. }));
    }
}
