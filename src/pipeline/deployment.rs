//! Deployment: promote working artifacts into the production area
//!
//! Copies the latest model, metric, and ingestion record into the
//! production directory under their canonical un-timestamped names. The
//! previous production artifacts are overwritten in place; there is no
//! rollback.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::store::{ArtifactKind, ArtifactStore};
use tracing::info;

/// Promote the latest model, metric, and ingestion record
///
/// Fails with a missing-artifact error if any of the three has never been
/// produced; a partial promotion can result when a later copy fails, which
/// is the same exposure the copy-per-file scheme always has.
pub fn deploy(config: &PipelineConfig) -> Result<()> {
    let models = ArtifactStore::new(&config.output_model_path);
    models.promote(ArtifactKind::Model, &config.prod_deployment_path)?;
    models.promote(ArtifactKind::Metric, &config.prod_deployment_path)?;

    let working = ArtifactStore::new(&config.output_folder_path);
    working.promote(ArtifactKind::IngestionRecord, &config.prod_deployment_path)?;

    info!(
        production = %config.prod_deployment_path.display(),
        "deployment complete"
    );
    Ok(())
}
