//! Reporting: confusion-matrix report for the production model
//!
//! Evaluates the deployed model on the held-out test set and writes a JSON
//! report with the confusion matrix and derived metrics next to the working
//! model artifacts.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::scoring::{self, ModelSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// File name of the generated report
pub const REPORT_FILE: &str = "confusion_matrix.json";

/// Structured evaluation report of the production model
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelReport {
    pub generated_at: String,
    /// Counts in `[[tn, fp], [fn, tp]]` layout
    pub confusion_matrix: [[usize; 2]; 2],
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub test_rows: usize,
}

/// Generate the report; returns the path written
pub fn report(config: &PipelineConfig) -> Result<PathBuf> {
    let model = scoring::load_model(config, ModelSource::Production)?;
    let test_set = scoring::load_test_set(config)?;
    let matrix = scoring::evaluate(&model, &test_set);

    let report = ModelReport {
        generated_at: chrono::Local::now().to_rfc3339(),
        confusion_matrix: matrix.as_rows(),
        accuracy: matrix.accuracy(),
        precision: matrix.precision(),
        recall: matrix.recall(),
        f1: matrix.f1(),
        test_rows: test_set.labels.len(),
    };

    std::fs::create_dir_all(&config.output_model_path)?;
    let path = config.output_model_path.join(REPORT_FILE);
    std::fs::write(&path, serde_json::to_vec_pretty(&report)?)?;
    info!(report = %path.display(), f1 = report.f1, "wrote model report");
    Ok(path)
}
