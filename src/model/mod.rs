//! Classifier wrapper and shared evaluation metrics
//!
//! `TrainedModel` couples the fitted logistic-regression classifier with
//! the feature-name schema it was trained on, so the serving layer can
//! assemble prediction input in the right column order. The blob persisted
//! by training and loaded by scoring is a bincode serialization of this
//! struct; serialization is lossless for the decision function.

pub mod metrics;

use crate::data::Supervised;
use crate::error::{PipelineError, Result};
use linfa::prelude::*;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Iteration cap for the solver, matching the fixed hyperparameter set
pub const MAX_ITERATIONS: u64 = 100;

/// A fitted binary classifier plus its input schema
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModel {
    classifier: FittedLogisticRegression<f64, usize>,
    feature_names: Vec<String>,
}

impl TrainedModel {
    /// Fit a logistic regression on prepared data
    ///
    /// Fails with a data error when the labels hold fewer than two classes;
    /// the solver has no decision boundary to fit in that case.
    pub fn fit(data: &Supervised) -> Result<Self> {
        let classes: HashSet<usize> = data.labels.iter().copied().collect();
        if classes.len() < 2 {
            return Err(PipelineError::Data(format!(
                "training labels contain {} class(es); at least two required",
                classes.len()
            )));
        }

        info!(
            rows = data.features.nrows(),
            features = data.features.ncols(),
            "fitting logistic regression"
        );
        let dataset = Dataset::new(data.features.clone(), data.labels.clone());
        let classifier = LogisticRegression::default()
            .max_iterations(MAX_ITERATIONS)
            .fit(&dataset)
            .map_err(|e| PipelineError::Model(e.to_string()))?;

        Ok(Self {
            classifier,
            feature_names: data.feature_names.clone(),
        })
    }

    /// Predict class labels for a feature matrix
    pub fn predict(&self, features: &Array2<f64>) -> Array1<usize> {
        self.classifier.predict(features)
    }

    /// Column order the model expects
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Serialize to the artifact blob format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from the artifact blob format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Load a model artifact from disk
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let model = Self::from_bytes(&bytes)?;
        debug!(model = %path.display(), "loaded trained model");
        Ok(model)
    }
}
