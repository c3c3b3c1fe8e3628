//! HTTP client for the HookCut job API.
//!
//! This crate provides:
//! - The [`JobApi`] trait the tracker polls through
//! - A reqwest implementation for `POST /api/jobs`, `GET /api/jobs/{id}`
//!   and `GET /api/jobs/{id}/download`
//! - Error classification into transient and fatal failures

pub mod client;
pub mod error;
pub mod metrics;

#[cfg(test)]
mod client_tests;

pub use client::{ClientConfig, JobApi, JobApiClient};
pub use error::{ClientError, ClientResult};
