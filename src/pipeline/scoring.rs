//! Scoring: evaluate a model against the held-out test set
//!
//! The single evaluation routine behind the orchestrator's drift check, the
//! standalone `score` command, and reporting. All of them concatenate the
//! test CSVs, drop the excluded columns, predict, and compute F1 with the
//! shared confusion-matrix code, so their metric semantics are identical.

use crate::config::PipelineConfig;
use crate::data::{self, Supervised};
use crate::error::Result;
use crate::model::{metrics::ConfusionMatrix, TrainedModel};
use crate::store::{production_path, ArtifactKind, ArtifactStore};
use tracing::info;

/// Where to load the model under evaluation from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    /// Latest timestamped artifact in the working model directory
    LatestWorking,
    /// Canonical artifact in the production directory
    Production,
}

/// Load a model per `source`
pub fn load_model(config: &PipelineConfig, source: ModelSource) -> Result<TrainedModel> {
    let path = match source {
        ModelSource::LatestWorking => {
            ArtifactStore::new(&config.output_model_path).latest_required(ArtifactKind::Model)?
        }
        ModelSource::Production => {
            let path = production_path(&config.prod_deployment_path, ArtifactKind::Model);
            if !path.exists() {
                return Err(crate::error::PipelineError::MissingArtifact {
                    kind: ArtifactKind::Model,
                    dir: config.prod_deployment_path.clone(),
                });
            }
            path
        }
    };
    TrainedModel::load(&path)
}

/// Load and prepare the held-out test set
pub fn load_test_set(config: &PipelineConfig) -> Result<Supervised> {
    let (df, _) = data::read_csv_dir(&config.test_data_path)?;
    let df = data::drop_excluded(&df)?;
    data::prepare_supervised(&df)
}

/// Confusion matrix of `model` over prepared data
pub fn evaluate(model: &TrainedModel, data: &Supervised) -> ConfusionMatrix {
    let predictions = model.predict(&data.features);
    ConfusionMatrix::from_labels(&data.labels, &predictions)
}

/// Score a model on the test set, optionally persisting the F1 as a new
/// timestamped metric artifact in the working model directory
pub fn score(config: &PipelineConfig, source: ModelSource, persist: bool) -> Result<f64> {
    let model = load_model(config, source)?;
    let test_set = load_test_set(config)?;
    let matrix = evaluate(&model, &test_set);
    let f1 = matrix.f1();
    info!(
        f1,
        accuracy = matrix.accuracy(),
        rows = test_set.labels.len(),
        source = ?source,
        "scored model on test set"
    );

    if persist {
        let metrics = ArtifactStore::new(&config.output_model_path);
        metrics.put(
            ArtifactKind::Metric,
            &metrics.fresh_timestamp(&[ArtifactKind::Metric]),
            f1.to_string().as_bytes(),
        )?;
    }
    Ok(f1)
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

    fn write_test_data(config: &PipelineConfig) {
        std::fs::create_dir_all(&config.test_data_path).unwrap();
        let mut body = String::from("lastmonth_activity,lastyear_activity,exited\n");
        for i in 0..10 {
            body.push_str(&format!("{},{},0\n", i, i + 1));
            body.push_str(&format!("{},{},1\n", 100 + i, 101 + i));
        }
        std::fs::write(config.test_data_path.join("testdata.csv"), body).unwrap();
    }

    fn fit_on_test_distribution(config: &PipelineConfig) -> TrainedModel {
        let prepared = load_test_set(config).unwrap();
        TrainedModel::fit(&prepared).unwrap()
    }

    #[test]
    fn test_score_latest_working_persists_metric() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        write_test_data(&config);

        let model = fit_on_test_distribution(&config);
        let models = ArtifactStore::new(&config.output_model_path);
        models
            .put(
                ArtifactKind::Model,
                "240101120000",
                &model.to_bytes().unwrap(),
            )
            .unwrap();

        let f1 = score(&config, ModelSource::LatestWorking, true).unwrap();
        assert!(f1 > 0.9);

        let metric_path = models.latest(ArtifactKind::Metric).unwrap().unwrap();
        let persisted: f64 = std::fs::read_to_string(metric_path)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        assert!((persisted - f1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_without_model_is_missing_artifact() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        write_test_data(&config);

        let err = score(&config, ModelSource::LatestWorking, false).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingArtifact {
                kind: ArtifactKind::Model,
                ..
            }
        ));
    }

    #[test]
    fn test_production_source_requires_canonical_file() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        write_test_data(&config);

        let err = score(&config, ModelSource::Production, false).unwrap_err();
        assert!(matches!(err, PipelineError::MissingArtifact { .. }));

        // Promote a model, then production scoring works
        let model = fit_on_test_distribution(&config);
        let models = ArtifactStore::new(&config.output_model_path);
        models
            .put(
                ArtifactKind::Model,
                "240101120000",
                &model.to_bytes().unwrap(),
            )
            .unwrap();
        models
            .promote(ArtifactKind::Model, &config.prod_deployment_path)
            .unwrap();

        let f1 = score(&config, ModelSource::Production, false).unwrap();
        assert!(f1 > 0.9);
    }
}
