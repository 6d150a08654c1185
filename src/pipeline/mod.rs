//! Pipeline stages
//!
//! Each stage is a synchronous, single-pass procedure that reads its path
//! parameters from `PipelineConfig` and communicates with the other stages
//! only through the artifact store. `orchestrator` wires them into the
//! drift-gated retraining cycle.

pub mod deployment;
pub mod ingestion;
pub mod orchestrator;
pub mod reporting;
pub mod scoring;
pub mod training;

pub use ingestion::{ingest, IngestionReport};
pub use orchestrator::{run, RunOutcome};
pub use scoring::{score, ModelSource};
pub use training::{train, TrainingReport};
