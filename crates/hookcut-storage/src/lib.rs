//! Object storage for source video uploads.
//!
//! This crate provides:
//! - The [`ObjectStore`] trait the submitter uploads through
//! - Cloudflare R2 (S3 API) and local-directory implementations
//! - The `uploads/{uid}/...` key layout

pub mod client;
pub mod error;
pub mod store;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use store::{sanitize_filename, upload_key, LocalStore, ObjectStore, StoredObject};
