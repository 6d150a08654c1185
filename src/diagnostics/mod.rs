//! Diagnostics for the dataset and the pipeline environment
//!
//! Per-column summary statistics, missing-value shares, wall-clock timing
//! of the ingestion and training stages, and the outdated-dependency
//! listing surfaced by the serving layer's `/diagnose` endpoint.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::{ingestion, training};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, info};

/// Mean, median, and standard deviation of one numeric column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
}

/// Share of null values in one column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub column: String,
    pub fraction_missing: f64,
}

/// Wall-clock duration of one ingestion and one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTimings {
    pub ingestion_seconds: f64,
    pub training_seconds: f64,
}

/// Combined diagnosis payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    pub missing_values: Vec<ColumnMissing>,
    pub execution_time: StageTimings,
    pub outdated_dependencies: String,
}

/// Summary statistics for every numeric column
pub fn summary_stats(df: &DataFrame) -> Vec<ColumnSummary> {
    df.get_columns()
        .iter()
        .filter(|series| series.dtype().is_numeric())
        .map(|series| {
            let std = series
                .cast(&DataType::Float64)
                .ok()
                .and_then(|s| s.f64().ok().and_then(|ca| ca.std(1)));
            ColumnSummary {
                column: series.name().to_string(),
                mean: series.mean(),
                median: series.median(),
                std,
            }
        })
        .collect()
}

/// Null fraction per column; zero for a column with no nulls
pub fn missing_percentages(df: &DataFrame) -> Vec<ColumnMissing> {
    let height = df.height();
    df.get_columns()
        .iter()
        .map(|series| ColumnMissing {
            column: series.name().to_string(),
            fraction_missing: if height == 0 {
                0.0
            } else {
                series.null_count() as f64 / height as f64
            },
        })
        .collect()
}

/// Time one ingestion run and one training run
///
/// The timed runs are real: they write a fresh snapshot, record, and model
/// artifact into the working areas, which stay there like every other
/// artifact.
pub fn time_stages(config: &PipelineConfig) -> Result<StageTimings> {
    info!("timing ingestion and training stages");

    let start = Instant::now();
    ingestion::ingest(config)?;
    let ingestion_seconds = start.elapsed().as_secs_f64();

    let start = Instant::now();
    training::train(config)?;
    let training_seconds = start.elapsed().as_secs_f64();

    Ok(StageTimings {
        ingestion_seconds,
        training_seconds,
    })
}

/// Outdated-dependency listing via `cargo outdated`
///
/// A missing or failing tool is a reported condition, not an error: the
/// returned string then describes why no listing is available.
pub fn outdated_dependencies() -> String {
    match Command::new("cargo").args(["outdated", "--root-deps-only"]).output() {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).into_owned()
        }
        Ok(output) => {
            debug!(status = ?output.status, "cargo outdated exited nonzero");
            format!(
                "cargo outdated failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )
        }
        Err(e) => format!("cargo outdated unavailable: {e}"),
    }
}

/// Full diagnosis of the loaded snapshot and the pipeline environment
pub fn diagnose(config: &PipelineConfig, snapshot: &DataFrame) -> Result<Diagnosis> {
    Ok(Diagnosis {
        missing_values: missing_percentages(snapshot),
        execution_time: time_stages(config)?,
        outdated_dependencies: outdated_dependencies(),
    })
}
