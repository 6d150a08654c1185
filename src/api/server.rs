//! Prediction API server
//!
//! Thin HTTP layer over the serving context: predictions, the current
//! production score, dataset summaries, diagnostics, and the explicit
//! reload the orchestrator's smoke test triggers after a promotion.

use super::state::{AppState, ServingContext};
use crate::config::PipelineConfig;
use crate::diagnostics::{self, ColumnSummary, Diagnosis};
use crate::error::PipelineError;
use crate::pipeline::scoring;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Error wrapper mapping pipeline errors onto HTTP statuses
#[derive(Debug)]
struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::Data(_) | PipelineError::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::MissingArtifact { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

/// Build the router over shared serving state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict_handler))
        .route("/score", get(score_handler))
        .route("/summarise", get(summarise_handler))
        .route("/diagnose", get(diagnose_handler))
        .route("/reload", post(reload_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Load the serving context and serve until shutdown
pub async fn serve(config: PipelineConfig, addr: SocketAddr) -> anyhow::Result<()> {
    let context = ServingContext::load(&config)?;
    let state = AppState::new(context);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("prediction API listening on http://{addr}");
    axum::serve(listener, router).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    /// Row-oriented records: one JSON object per row
    data: Vec<serde_json::Map<String, Value>>,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    predictions: Vec<usize>,
}

async fn predict_handler(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let ctx = state.context().await;
    let predictions = ctx.predict_rows(&request.data)?;
    Ok(Json(PredictResponse { predictions }))
}

#[derive(Debug, Serialize)]
struct ScoreResponse {
    score: f64,
}

/// F1 of the in-memory production model over the held-out test set
async fn score_handler(State(state): State<AppState>) -> Result<Json<ScoreResponse>, ApiError> {
    let ctx = state.context().await;
    let test_set = scoring::load_test_set(&ctx.config)?;
    let matrix = scoring::evaluate(&ctx.model, &test_set);
    Ok(Json(ScoreResponse { score: matrix.f1() }))
}

#[derive(Debug, Serialize)]
struct SummariseResponse {
    summary: Vec<ColumnSummary>,
}

async fn summarise_handler(State(state): State<AppState>) -> Json<SummariseResponse> {
    let ctx = state.context().await;
    Json(SummariseResponse {
        summary: diagnostics::summary_stats(&ctx.snapshot),
    })
}

async fn diagnose_handler(State(state): State<AppState>) -> Result<Json<Diagnosis>, ApiError> {
    let ctx = state.context().await;
    let diagnosis = diagnostics::diagnose(&ctx.config, &ctx.snapshot)?;
    Ok(Json(diagnosis))
}

#[derive(Debug, Serialize)]
struct ReloadResponse {
    reloaded: bool,
}

async fn reload_handler(State(state): State<AppState>) -> Result<Json<ReloadResponse>, ApiError> {
    state.reload().await?;
    Ok(Json(ReloadResponse { reloaded: true }))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
