//! Serving state: the loaded model and dataset
//!
//! The production model and the latest snapshot are loaded once at startup
//! into a `ServingContext` held behind a lock. `reload` swaps in a freshly
//! loaded context after a promotion, so picking up a new model does not
//! require a process restart.

use crate::config::PipelineConfig;
use crate::data;
use crate::error::{PipelineError, Result};
use crate::model::TrainedModel;
use crate::pipeline::scoring::{self, ModelSource};
use crate::store::{ArtifactKind, ArtifactStore};
use ndarray::Array2;
use polars::prelude::DataFrame;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Everything a request handler needs: production model, latest snapshot,
/// and the path configuration
#[derive(Debug)]
pub struct ServingContext {
    pub model: TrainedModel,
    pub snapshot: DataFrame,
    pub config: PipelineConfig,
}

impl ServingContext {
    /// Load the production model and the latest snapshot (excluded columns
    /// dropped). Fails when either artifact is missing.
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let model = scoring::load_model(config, ModelSource::Production)?;

        let snapshots = ArtifactStore::new(&config.output_folder_path);
        let snapshot_path = snapshots.latest_required(ArtifactKind::Dataset)?;
        let snapshot = data::drop_excluded(&data::read_csv(&snapshot_path)?)?;

        info!(
            snapshot = %snapshot_path.display(),
            rows = snapshot.height(),
            "serving context loaded"
        );
        Ok(Self {
            model,
            snapshot,
            config: config.clone(),
        })
    }

    /// Predict labels for row-oriented JSON records
    ///
    /// Each record must carry a numeric value for every feature the model
    /// was trained on; extra keys are ignored.
    pub fn predict_rows(&self, rows: &[serde_json::Map<String, Value>]) -> Result<Vec<usize>> {
        let names = self.model.feature_names();
        let mut flat = Vec::with_capacity(rows.len() * names.len());
        for (i, row) in rows.iter().enumerate() {
            for name in names {
                let value = row
                    .get(name)
                    .and_then(Value::as_f64)
                    .ok_or_else(|| {
                        PipelineError::Data(format!(
                            "row {i} is missing numeric feature '{name}'"
                        ))
                    })?;
                flat.push(value);
            }
        }
        let features = Array2::from_shape_vec((rows.len(), names.len()), flat)
            .map_err(|e| PipelineError::Data(e.to_string()))?;
        Ok(self.model.predict(&features).to_vec())
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    context: Arc<RwLock<ServingContext>>,
}

impl AppState {
    pub fn new(context: ServingContext) -> Self {
        Self {
            context: Arc::new(RwLock::new(context)),
        }
    }

    /// Read access to the current context
    pub async fn context(&self) -> tokio::sync::RwLockReadGuard<'_, ServingContext> {
        self.context.read().await
    }

    /// Replace the context with a freshly loaded one
    ///
    /// The old context keeps serving until the new one is ready; a failed
    /// load leaves the old context in place.
    pub async fn reload(&self) -> Result<()> {
        let config = self.context.read().await.config.clone();
        let fresh = ServingContext::load(&config)?;
        *self.context.write().await = fresh;
        info!("serving context reloaded");
        Ok(())
    }
}
