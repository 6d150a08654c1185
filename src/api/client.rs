//! Post-deployment smoke test
//!
//! After a promotion the orchestrator asks the serving process to reload,
//! exercises every live endpoint against the held-out test data, and
//! persists the combined responses as a timestamped audit artifact.

use crate::config::PipelineConfig;
use crate::data;
use crate::error::Result;
use crate::store::{ArtifactKind, ArtifactStore};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

/// Row-oriented JSON records for the prediction endpoint
fn prediction_payload(config: &PipelineConfig) -> Result<Vec<serde_json::Map<String, Value>>> {
    let (df, _) = data::read_csv_dir(&config.test_data_path)?;
    let df = data::drop_excluded(&df)?;
    let (features_df, _label) = data::split_label(&df)?;

    let names: Vec<String> = features_df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let matrix = data::feature_matrix(&features_df)?;

    let mut rows = Vec::with_capacity(matrix.nrows());
    for row in matrix.rows() {
        let mut record = serde_json::Map::new();
        for (name, value) in names.iter().zip(row.iter()) {
            record.insert(name.clone(), json!(value));
        }
        rows.push(record);
    }
    Ok(rows)
}

/// Reload the serving process, call every endpoint, persist the audit file
///
/// Returns the path of the written audit artifact.
pub async fn smoke_test(config: &PipelineConfig) -> Result<PathBuf> {
    let base = config.api_base_url.trim_end_matches('/');
    let client = reqwest::Client::new();

    info!(base, "running post-deployment smoke test");
    let reloaded: Value = client
        .post(format!("{base}/reload"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let payload = prediction_payload(config)?;
    let predictions: Value = client
        .post(format!("{base}/predict"))
        .json(&json!({ "data": payload }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let score: Value = client
        .get(format!("{base}/score"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let summary: Value = client
        .get(format!("{base}/summarise"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let diagnosis: Value = client
        .get(format!("{base}/diagnose"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let combined = json!({
        "reloaded": reloaded,
        "predictions": predictions,
        "score": score,
        "summary": summary,
        "diagnosis": diagnosis,
    });

    let audits = ArtifactStore::new(&config.output_model_path);
    let path = audits.put(
        ArtifactKind::ApiAudit,
        &audits.fresh_timestamp(&[ArtifactKind::ApiAudit]),
        serde_json::to_string_pretty(&combined)?.as_bytes(),
    )?;
    info!(audit = %path.display(), "smoke test responses persisted");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prediction_payload_excludes_label_and_dropped_columns() {
        let root = TempDir::new().unwrap();
        let config = PipelineConfig {
            input_folder_path: root.path().join("sourcedata"),
            output_folder_path: root.path().join("ingesteddata"),
            prod_deployment_path: root.path().join("production"),
            output_model_path: root.path().join("models"),
            test_data_path: root.path().join("testdata"),
            api_base_url: "http://127.0.0.1:8000".to_string(),
        };
        std::fs::create_dir_all(&config.test_data_path).unwrap();
        std::fs::write(
            config.test_data_path.join("testdata.csv"),
            "corporation,lastmonth_activity,exited\nacme,1,0\nglobex,2,1\n",
        )
        .unwrap();

        let rows = prediction_payload(&config).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains_key("lastmonth_activity"));
        assert!(!rows[0].contains_key("corporation"));
        assert!(!rows[0].contains_key("exited"));
    }
}
