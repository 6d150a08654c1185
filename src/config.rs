//! Pipeline configuration
//!
//! Every component receives its path parameters from a single JSON
//! configuration file, loaded once per invocation. The file location is
//! resolved from the `--config` flag, the `DRIFTGATE_CONFIG` environment
//! variable, then `./config.json`. A missing or malformed configuration
//! aborts before any side effect.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file name in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Static path configuration shared by every pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory scanned for candidate source CSVs
    pub input_folder_path: PathBuf,
    /// Working area for dataset snapshots and ingestion records
    pub output_folder_path: PathBuf,
    /// Production area: one canonical artifact per kind
    pub prod_deployment_path: PathBuf,
    /// Working area for model and metric artifacts
    pub output_model_path: PathBuf,
    /// Directory holding the held-out test CSVs
    pub test_data_path: PathBuf,
    /// Base URL of the serving process, used by the smoke test
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::Config(format!("malformed {}: {}", path.display(), e))
        })?;
        debug!(config = %path.display(), "loaded pipeline configuration");
        Ok(config)
    }

    /// Resolve the configuration path from CLI flag, env var, or default
    pub fn resolve_path(cli_path: Option<PathBuf>) -> PathBuf {
        cli_path
            .or_else(|| std::env::var("DRIFTGATE_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Path of the advisory lock taken by the orchestrator
    pub fn lock_path(&self) -> PathBuf {
        self.output_folder_path.join(".driftgate.lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{
                "input_folder_path": "sourcedata",
                "output_folder_path": "ingesteddata",
                "prod_deployment_path": "production",
                "output_model_path": "models",
                "test_data_path": "testdata"
            }"#,
        );

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.input_folder_path, PathBuf::from("sourcedata"));
        assert_eq!(config.api_base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"input_folder_path": "sourcedata"}"#);

        let err = PipelineConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = PipelineConfig::from_file("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_resolve_path_prefers_cli_flag() {
        let resolved = PipelineConfig::resolve_path(Some(PathBuf::from("custom.json")));
        assert_eq!(resolved, PathBuf::from("custom.json"));
    }
}
