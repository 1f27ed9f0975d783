//! labforge: synthetic scientific dataset generation and persistence.
//!
//! This library generates multi-group synthetic datasets from compiled-in
//! domain presets, persists them independently to a blob store and/or a
//! tabular warehouse, and provides read-side access to what was stored.

pub mod analysis;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod facade;
pub mod generator;
pub mod persist;
pub mod storage;

// Re-export commonly used error types
pub use error::{FacadeError, GeneratorError, StorageError, WarehouseError};
