//! Prediction API: serving state, HTTP server, and smoke-test client

pub mod client;
pub mod server;
pub mod state;

pub use server::{build_router, serve};
pub use state::{AppState, ServingContext};
