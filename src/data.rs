//! Dataset handling
//!
//! CSV loading, concatenation, duplicate removal, and conversion to the
//! numeric matrices the classifier consumes. Concatenation requires
//! union-compatible schemas; a mismatch surfaces as a dataframe error at
//! the stage that hits it, never as a silent partial ingest.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Binary target column
pub const LABEL_COLUMN: &str = "exited";

/// Columns excluded from every model input
pub const EXCLUDED_COLUMNS: &[&str] = &["corporation"];

/// Fixed seed for the train/validation split: identical input yields an
/// identical split
pub const SPLIT_SEED: u64 = 42;

/// Read a single CSV file into a DataFrame
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReader::from_path(path)?.has_header(true).finish()?;
    debug!(
        file = %path.display(),
        rows = df.height(),
        cols = df.width(),
        "read CSV"
    );
    Ok(df)
}

/// All `*.csv` files directly under `dir`, in sorted order
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read and vertically concatenate every CSV in `dir`
///
/// Returns the combined frame and the list of consumed paths. Zero CSVs is
/// a data error; one unreadable file fails the whole read.
pub fn read_csv_dir(dir: &Path) -> Result<(DataFrame, Vec<PathBuf>)> {
    let files = list_csv_files(dir)?;
    if files.is_empty() {
        return Err(PipelineError::Data(format!(
            "no CSV files found in {}",
            dir.display()
        )));
    }

    let mut combined = read_csv(&files[0])?;
    for path in &files[1..] {
        let next = read_csv(path)?;
        combined = combined.vstack(&next)?;
    }
    Ok((combined, files))
}

/// Remove exact duplicate rows, keeping first occurrences
pub fn drop_duplicates(df: &DataFrame) -> Result<DataFrame> {
    let deduped = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    debug!(
        before = df.height(),
        after = deduped.height(),
        "dropped duplicate rows"
    );
    Ok(deduped)
}

/// Drop the excluded columns, ignoring ones not present
pub fn drop_excluded(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();
    for col in EXCLUDED_COLUMNS {
        if out.get_column_names().contains(col) {
            out = out.drop(col)?;
        }
    }
    Ok(out)
}

/// Serialize a frame to CSV bytes (header included)
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut df = df.clone();
    CsvWriter::new(&mut buf).include_header(true).finish(&mut df)?;
    Ok(buf)
}

/// Split off the label column, leaving the feature frame
pub fn split_label(df: &DataFrame) -> Result<(DataFrame, Series)> {
    let mut features = df.clone();
    let label = features.drop_in_place(LABEL_COLUMN).map_err(|_| {
        PipelineError::Data(format!("label column '{}' not present", LABEL_COLUMN))
    })?;
    Ok((features, label))
}

/// Feature frame as a row-major f64 matrix
pub fn feature_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    Ok(df.to_ndarray::<Float64Type>(IndexOrder::C)?)
}

/// Label series as class indices
pub fn label_vector(series: &Series) -> Result<Array1<usize>> {
    let ints = series.cast(&DataType::Int64)?;
    let ints = ints.i64()?;
    let mut labels = Vec::with_capacity(ints.len());
    for value in ints.into_iter() {
        match value {
            Some(v) if v >= 0 => labels.push(v as usize),
            Some(v) => {
                return Err(PipelineError::Data(format!(
                    "negative label value {} in '{}'",
                    v, LABEL_COLUMN
                )))
            }
            None => {
                return Err(PipelineError::Data(format!(
                    "null label value in '{}'",
                    LABEL_COLUMN
                )))
            }
        }
    }
    Ok(Array1::from(labels))
}

/// Features plus labels plus the feature-name schema, ready for fitting
#[derive(Debug)]
pub struct Supervised {
    pub features: Array2<f64>,
    pub labels: Array1<usize>,
    pub feature_names: Vec<String>,
}

/// Prepare a frame for supervised use: split off the label, convert the
/// rest to a numeric matrix
pub fn prepare_supervised(df: &DataFrame) -> Result<Supervised> {
    let (features_df, label) = split_label(df)?;
    let feature_names = features_df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    Ok(Supervised {
        features: feature_matrix(&features_df)?,
        labels: label_vector(&label)?,
        feature_names,
    })
}

/// Reproducible row split: shuffle indices with a seeded RNG, hold out
/// `validation_fraction` of the rows
pub fn train_validation_split(
    df: &DataFrame,
    validation_fraction: f64,
    seed: u64,
) -> Result<(DataFrame, DataFrame)> {
    let height = df.height();
    if height == 0 {
        return Err(PipelineError::Data("dataset has zero rows".to_string()));
    }

    let mut indices: Vec<u32> = (0..height as u32).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let val_len = ((height as f64) * validation_fraction).round() as usize;
    if val_len >= height {
        return Err(PipelineError::Data(format!(
            "validation fraction {} leaves no training rows",
            validation_fraction
        )));
    }

    let (val_idx, train_idx) = indices.split_at(val_len);
    let train = df.take(&IdxCa::from_vec("idx", train_idx.to_vec()))?;
    let val = df.take(&IdxCa::from_vec("idx", val_idx.to_vec()))?;
    Ok((train, val))
}
