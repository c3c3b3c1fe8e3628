//! Development job API server.
//!
//! This crate provides:
//! - The `/api/jobs` REST contract the tracker polls
//! - An in-memory job store
//! - A simulated worker that walks jobs through the render phases
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use config::{ApiConfig, WorkerConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::SimulatedWorker;
pub use state::AppState;
pub use store::{InMemoryJobStore, JobStore, StoreError};
