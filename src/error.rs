//! Error types for the driftgate pipeline
//!
//! Structured error definitions via thiserror; anyhow is used only at the
//! binary boundary. "No matching artifact" is an explicit variant rather
//! than an exception caught for control flow: callers that can tolerate an
//! absent artifact go through `store::latest`, which returns `Option`.

use crate::store::ArtifactKind;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration missing, unreadable, or malformed
    #[error("configuration error: {0}")]
    Config(String),

    /// A required artifact was not found in the given directory
    #[error("no {kind} found in {}", dir.display())]
    MissingArtifact { kind: ArtifactKind, dir: PathBuf },

    /// Refusing to overwrite an existing working artifact
    #[error("artifact already exists at {}", .0.display())]
    ArtifactExists(PathBuf),

    /// Dataset-level failure (empty input, single-class labels, bad schema)
    #[error("data error: {0}")]
    Data(String),

    /// Model fitting or prediction failed
    #[error("model error: {0}")]
    Model(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// DataFrame operation failed (parse error, schema mismatch on concat)
    #[error("dataframe error: {0}")]
    Frame(#[from] polars::error::PolarsError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Model blob (de)serialization error
    #[error("model serialization error: {0}")]
    ModelBlob(#[from] bincode::Error),

    /// HTTP request to the serving layer failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Crontab manipulation failed
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Another orchestrator run holds the advisory lock
    #[error("another pipeline run holds the lock at {}", .0.display())]
    LockHeld(PathBuf),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_display() {
        let err = PipelineError::MissingArtifact {
            kind: ArtifactKind::Model,
            dir: PathBuf::from("/tmp/models"),
        };
        assert_eq!(err.to_string(), "no trained model found in /tmp/models");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PipelineError = io.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
