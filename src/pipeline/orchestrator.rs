//! Drift-gated orchestrator
//!
//! One run is one linear pass through
//! `CHECK_NEW_DATA -> INGEST -> TRAIN_AND_SCORE -> COMPARE -> {PROMOTE, STOP}`.
//! Both stop outcomes are normal terminal results. Working-area artifacts
//! produced by a run that stops at the gate are kept, never rolled back.
//!
//! An advisory lock file enforces at most one run at a time; overlapping
//! runs would race on the second-resolution timestamp convention.

use crate::api::client;
use crate::config::PipelineConfig;
use crate::data;
use crate::error::{PipelineError, Result};
use crate::pipeline::{deployment, ingestion, reporting, scoring, training};
use crate::store::{self, production_path, ArtifactKind, RunLock};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Terminal outcome of one orchestrator run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// No candidate file outside the production ingestion record
    NoNewData,
    /// Retrained, but the candidate did not strictly beat production
    NoImprovement { new_f1: f64, old_f1: f64 },
    /// Candidate promoted to production
    Promoted { new_f1: f64, old_f1: f64 },
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::NoNewData => write!(f, "no new data; nothing to do"),
            RunOutcome::NoImprovement { new_f1, old_f1 } => write!(
                f,
                "production model performs better (new F1 {new_f1}, old F1 {old_f1}); not promoted"
            ),
            RunOutcome::Promoted { new_f1, old_f1 } => {
                write!(f, "promoted new model (new F1 {new_f1}, old F1 {old_f1})")
            }
        }
    }
}

/// Strict-improvement drift gate: ties do not promote
pub fn improves(new_f1: f64, old_f1: f64) -> bool {
    new_f1 > old_f1
}

/// Candidate CSVs in `input_dir` whose paths are absent from the
/// production ingestion record
///
/// This is a set difference on file paths, not content hashes: a file with
/// changed content under an already-recorded path is not detected as new.
pub fn check_new_files(input_dir: &Path, record_path: &Path) -> Result<Vec<PathBuf>> {
    let record = std::fs::read_to_string(record_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipelineError::MissingArtifact {
                kind: ArtifactKind::IngestionRecord,
                dir: record_path
                    .parent()
                    .unwrap_or(Path::new("."))
                    .to_path_buf(),
            }
        } else {
            PipelineError::Io(e)
        }
    })?;
    let recorded: HashSet<&str> = record.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let candidates = data::list_csv_files(input_dir)?;
    Ok(candidates
        .into_iter()
        .filter(|path| !recorded.contains(path.to_string_lossy().as_ref()))
        .collect())
}

/// Execute one full drift-gated pipeline run
pub async fn run(config: &PipelineConfig) -> Result<RunOutcome> {
    let _lock = RunLock::acquire(config.lock_path())?;

    info!(
        input = %config.input_folder_path.display(),
        "checking for new source files"
    );
    let record_path = production_path(&config.prod_deployment_path, ArtifactKind::IngestionRecord);
    let new_files = check_new_files(&config.input_folder_path, &record_path)?;
    if new_files.is_empty() {
        info!("no new source files; ending run");
        return Ok(RunOutcome::NoNewData);
    }
    info!(count = new_files.len(), "new source files detected");

    ingestion::ingest(config)?;

    // Baseline first: a missing production metric aborts before the cost
    // of a training run. "No baseline" never means "always promote".
    let metric_path = production_path(&config.prod_deployment_path, ArtifactKind::Metric);
    let old_f1 = store::read_metric(&metric_path)?;

    let training_report = training::train(config)?;
    info!(
        model = %training_report.model_path.display(),
        validation_f1 = training_report.validation_f1,
        "candidate model trained"
    );
    let new_f1 = scoring::score(config, scoring::ModelSource::LatestWorking, true)?;

    if !improves(new_f1, old_f1) {
        info!(new_f1, old_f1, "no drift improvement; not promoting");
        return Ok(RunOutcome::NoImprovement { new_f1, old_f1 });
    }

    info!(new_f1, old_f1, "model drift detected; promoting");
    deployment::deploy(config)?;
    reporting::report(config)?;

    // The serving process loads its model once; the smoke test starts with
    // an explicit reload so the endpoints exercise the new production
    // model. Promotion is already durable, so an unreachable server is
    // reported but does not fail the run.
    if let Err(e) = client::smoke_test(config).await {
        warn!("post-deployment smoke test failed: {e}");
    }

    Ok(RunOutcome::Promoted { new_f1, old_f1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_drift_gate_is_strict() {
        assert!(improves(0.75, 0.70));
        assert!(!improves(0.70, 0.70));
        assert!(!improves(0.65, 0.70));
    }

    #[test]
    fn test_check_new_files_set_difference() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("sourcedata");
        std::fs::create_dir_all(&input).unwrap();
        let a = input.join("a.csv");
        let b = input.join("b.csv");
        std::fs::write(&a, "x\n1\n").unwrap();
        std::fs::write(&b, "x\n2\n").unwrap();

        let record = root.path().join("ingestedfiles.txt");
        std::fs::write(&record, format!("{}\n{}\n", a.display(), b.display())).unwrap();

        // Every candidate recorded -> no new data
        assert!(check_new_files(&input, &record).unwrap().is_empty());

        // One unrecorded candidate -> new data found
        std::fs::write(input.join("c.csv"), "x\n3\n").unwrap();
        let new_files = check_new_files(&input, &record).unwrap();
        assert_eq!(new_files.len(), 1);
        assert!(new_files[0].ends_with("c.csv"));
    }

    #[test]
    fn test_check_new_files_missing_record_is_missing_artifact() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("sourcedata");
        std::fs::create_dir_all(&input).unwrap();

        let err =
            check_new_files(&input, &root.path().join("production/ingestedfiles.txt")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingArtifact {
                kind: ArtifactKind::IngestionRecord,
                ..
            }
        ));
    }

    #[test]
    fn test_outcome_display_reports_both_scores() {
        let outcome = RunOutcome::NoImprovement {
            new_f1: 0.65,
            old_f1: 0.7,
        };
        let text = outcome.to_string();
        assert!(text.contains("0.65"));
        assert!(text.contains("0.7"));
    }
}
