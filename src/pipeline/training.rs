//! Training: fit a classifier on the latest dataset snapshot
//!
//! Loads the most recent snapshot, drops the excluded columns, holds out a
//! fixed fraction of rows with a seeded shuffle (identical input gives an
//! identical split), fits the classifier, and persists it as a timestamped
//! model artifact. Validation accuracy and F1 are logged, not persisted.

use crate::config::PipelineConfig;
use crate::data::{self, SPLIT_SEED};
use crate::error::Result;
use crate::model::{metrics::ConfusionMatrix, TrainedModel};
use crate::store::{ArtifactKind, ArtifactStore};
use std::path::PathBuf;
use tracing::info;

/// Fraction of snapshot rows held out for validation
pub const VALIDATION_FRACTION: f64 = 0.1;

/// Outcome of one training run
#[derive(Debug)]
pub struct TrainingReport {
    pub model_path: PathBuf,
    pub validation_accuracy: f64,
    pub validation_f1: f64,
}

/// Run training once against the latest snapshot
pub fn train(config: &PipelineConfig) -> Result<TrainingReport> {
    let snapshots = ArtifactStore::new(&config.output_folder_path);
    let snapshot_path = snapshots.latest_required(ArtifactKind::Dataset)?;

    let snapshot = data::read_csv(&snapshot_path)?;
    let snapshot = data::drop_excluded(&snapshot)?;
    info!(
        snapshot = %snapshot_path.display(),
        rows = snapshot.height(),
        "training on latest snapshot"
    );

    let (train_df, val_df) =
        data::train_validation_split(&snapshot, VALIDATION_FRACTION, SPLIT_SEED)?;
    let train_data = data::prepare_supervised(&train_df)?;
    let val_data = data::prepare_supervised(&val_df)?;

    let model = TrainedModel::fit(&train_data)?;

    let predictions = model.predict(&val_data.features);
    let matrix = ConfusionMatrix::from_labels(&val_data.labels, &predictions);
    let validation_accuracy = matrix.accuracy();
    let validation_f1 = matrix.f1();
    info!(
        accuracy = validation_accuracy,
        f1 = validation_f1,
        "validation metrics"
    );

    let models = ArtifactStore::new(&config.output_model_path);
    let model_path = models.put(
        ArtifactKind::Model,
        &models.fresh_timestamp(&[ArtifactKind::Model]),
        &model.to_bytes()?,
    )?;

    Ok(TrainingReport {
        model_path,
        validation_accuracy,
        validation_f1,
    })
}
