//! Driftgate - Drift-Gated ML Pipeline
//!
//! A batch retraining pipeline built around a versioned, file-based
//! artifact store:
//! - **Store**: timestamped working artifacts, canonical production
//!   artifacts, promotion, advisory run lock
//! - **Pipeline**: ingestion, training, scoring, deployment, reporting,
//!   and the drift-gated orchestrator wiring them together
//! - **Serving**: axum prediction API over the production model, with an
//!   explicit reload after promotions
//! - **Scheduler**: crontab management for the periodic trigger
//!
//! All stages communicate only through files; one orchestrator run is one
//! synchronous pass with no internal parallelism.
//!
//! # Example
//!
//! ```ignore
//! use driftgate::{pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::from_file("config.json")?;
//!     let outcome = pipeline::run(&config).await?;
//!     println!("{outcome}");
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod scheduler;
pub mod store;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use model::TrainedModel;
pub use pipeline::{ModelSource, RunOutcome};
pub use store::{ArtifactKind, ArtifactStore};
