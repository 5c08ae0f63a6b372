//! Memoria Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and the
//! record-store seam shared by the upload engine, the HTTP client and the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use config::{LinkLookup, UploadConfig};
pub use error::{ConstraintViolation, ErrorMetadata, LogLevel, UploadError};
pub use store::{RecordStore, StoreError, StoreResult};
