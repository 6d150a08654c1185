//! Ingestion: merge raw source CSVs into one dataset snapshot
//!
//! Reads every CSV in the input directory, concatenates the rows, removes
//! exact duplicates, and writes a timestamped snapshot plus an ingestion
//! record listing the consumed paths. No partial success: one unreadable
//! file fails the whole run, and nothing written earlier is cleaned up.

use crate::config::PipelineConfig;
use crate::data;
use crate::error::Result;
use crate::store::{ArtifactKind, ArtifactStore};
use std::path::PathBuf;
use tracing::info;

/// Outcome of one ingestion run
#[derive(Debug)]
pub struct IngestionReport {
    pub snapshot_path: PathBuf,
    pub record_path: PathBuf,
    pub rows_read: usize,
    pub rows_written: usize,
}

/// Run ingestion once
pub fn ingest(config: &PipelineConfig) -> Result<IngestionReport> {
    let (combined, consumed) = data::read_csv_dir(&config.input_folder_path)?;
    let rows_read = combined.height();

    let snapshot = data::drop_duplicates(&combined)?;
    let rows_written = snapshot.height();

    let working = ArtifactStore::new(&config.output_folder_path);
    let timestamp =
        working.fresh_timestamp(&[ArtifactKind::Dataset, ArtifactKind::IngestionRecord]);

    let snapshot_path = working.put(
        ArtifactKind::Dataset,
        &timestamp,
        &data::to_csv_bytes(&snapshot)?,
    )?;

    let record_body = consumed
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    let record_path = working.put(
        ArtifactKind::IngestionRecord,
        &timestamp,
        record_body.as_bytes(),
    )?;

    info!(
        files = consumed.len(),
        rows_read,
        rows_written,
        snapshot = %snapshot_path.display(),
        "ingestion complete"
    );
    Ok(IngestionReport {
        snapshot_path,
        record_path,
        rows_read,
        rows_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use tempfile::TempDir;

    fn test_config(root: &TempDir) -> PipelineConfig {
        PipelineConfig {
            input_folder_path: root.path().join("sourcedata"),
            output_folder_path: root.path().join("ingesteddata"),
            prod_deployment_path: root.path().join("production"),
            output_model_path: root.path().join("models"),
            test_data_path: root.path().join("testdata"),
            api_base_url: "http://127.0.0.1:8000".to_string(),
        }
    }

    #[test]
    fn test_ingest_merges_and_deduplicates() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        std::fs::create_dir_all(&config.input_folder_path).unwrap();
        std::fs::write(
            config.input_folder_path.join("one.csv"),
            "x,exited\n1,0\n2,1\n",
        )
        .unwrap();
        std::fs::write(
            config.input_folder_path.join("two.csv"),
            "x,exited\n2,1\n3,0\n",
        )
        .unwrap();

        let report = ingest(&config).unwrap();
        // 4 rows read, one exact duplicate dropped
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.rows_written, 3);
        assert!(report.snapshot_path.exists());

        let record = std::fs::read_to_string(&report.record_path).unwrap();
        let lines: Vec<&str> = record.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("one.csv"));
        assert!(lines[1].ends_with("two.csv"));
    }

    #[test]
    fn test_ingest_empty_input_fails() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        std::fs::create_dir_all(&config.input_folder_path).unwrap();

        let err = ingest(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Data(_)));
    }
}
