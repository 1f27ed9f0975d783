//! Storage backends for generated datasets.
//!
//! Two independent backends are abstracted behind traits so they can be
//! swapped for in-memory implementations in tests:
//! - [`ObjectStore`]: blob storage addressed by bucket + key, holding
//!   whole-dataset JSON documents
//! - [`Warehouse`]: tabular, SQL-queryable storage holding one row per sample
//!
//! The HTTP implementations ([`GcsStore`], [`BigQueryWarehouse`]) are thin
//! wrappers over the vendor REST APIs: single best-effort calls, no retries,
//! client-default timeouts.

pub mod blob;
pub mod memory;
pub mod warehouse;

pub use blob::{BlobMeta, GcsStore, ObjectStore};
pub use memory::{MemoryStore, MemoryWarehouse};
pub use warehouse::{BigQueryWarehouse, ColumnSpec, TableDetails, Warehouse};
