//! Error types for labforge operations.
//!
//! Defines error types for the major subsystems:
//! - Dataset generation
//! - Blob object storage
//! - Warehouse (tabular) storage
//! - The read-side catalog/query facade

use thiserror::Error;

/// Errors that can occur during dataset generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    #[error("Noise distribution error: {0}")]
    NoiseDistribution(String),
}

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Object '{0}' not found")]
    NotFound(String),

    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Warehouse API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Row insert failed: {0}")]
    InsertFailed(String),

    #[error("Invalid table path '{0}': use 'table' or 'project.dataset.table'")]
    InvalidTableRef(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the read-side facade.
///
/// Backend failures in the query path are classified into the more specific
/// variants so callers can render actionable messages.
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("Access denied: {0}. Check that the service account has the required permissions.")]
    PermissionDenied(String),

    #[error("Table or dataset not found: {0}. Verify the table path is correct (project.dataset.table).")]
    NotFound(String),

    #[error("Invalid SQL query: {0}. Check SQL syntax and column names.")]
    InvalidQuery(String),

    #[error("Invalid blob path '{0}': expected a gs://bucket/key URI")]
    InvalidPath(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("Failed to parse stored dataset: {0}")]
    MalformedDataset(#[from] serde_json::Error),
}
