//! In-memory storage backends for isolated tests.
//!
//! These implement the same traits as the HTTP clients so the persister and
//! facade can be exercised without network access. `MemoryWarehouse` has a
//! fail-on-insert switch for simulating backend failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{StorageError, WarehouseError};
use crate::storage::blob::{BlobMeta, ObjectStore};
use crate::storage::warehouse::{ColumnSpec, TableDetails, Warehouse};

/// In-memory [`ObjectStore`].
pub struct MemoryStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>,
}

impl MemoryStore {
    /// Creates an empty store pretending to be `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> usize {
        self.objects.lock().expect("store lock").len()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.objects
            .lock()
            .expect("store lock")
            .insert(key.to_string(), (bytes.to_vec(), Utc::now()));
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .lock()
            .expect("store lock")
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, StorageError> {
        Ok(self
            .objects
            .lock()
            .expect("store lock")
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, (bytes, created))| BlobMeta {
                name: key.clone(),
                size_bytes: bytes.len() as u64,
                created: Some(*created),
            })
            .collect())
    }
}

#[derive(Default)]
struct MemoryTable {
    schema: Vec<ColumnSpec>,
    rows: Vec<Value>,
    created: Option<DateTime<Utc>>,
}

/// In-memory [`Warehouse`].
///
/// `query` is a listing fake, not a SQL engine: it returns every row of the
/// first stored table whose name appears in the query text.
pub struct MemoryWarehouse {
    project: String,
    dataset: String,
    tables: Mutex<BTreeMap<String, MemoryTable>>,
    dataset_exists: AtomicBool,
    fail_inserts: AtomicBool,
}

impl MemoryWarehouse {
    /// Creates an empty warehouse pretending to be `project.dataset`.
    pub fn new(project: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            tables: Mutex::new(BTreeMap::new()),
            dataset_exists: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent insert fail, simulating a backend outage.
    pub fn fail_next_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Whether `ensure_dataset` has been called.
    pub fn dataset_created(&self) -> bool {
        self.dataset_exists.load(Ordering::SeqCst)
    }

    /// Rows currently stored in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .expect("warehouse lock")
            .get(table)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    fn table_ref(&self, table: &str) -> String {
        format!("{}.{}.{}", self.project, self.dataset, table)
    }

    async fn ensure_dataset(&self) -> Result<(), WarehouseError> {
        self.dataset_exists.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn create_table(&self, table: &str, schema: &[ColumnSpec]) -> Result<(), WarehouseError> {
        let mut tables = self.tables.lock().expect("warehouse lock");
        tables.entry(table.to_string()).or_insert(MemoryTable {
            schema: schema.to_vec(),
            rows: Vec::new(),
            created: Some(Utc::now()),
        });
        Ok(())
    }

    async fn insert_rows(&self, table: &str, rows: &[Value]) -> Result<(), WarehouseError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(WarehouseError::InsertFailed(
                "simulated backend failure".to_string(),
            ));
        }

        let mut tables = self.tables.lock().expect("warehouse lock");
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| WarehouseError::TableNotFound(table.to_string()))?;
        entry.rows.extend(rows.iter().cloned());
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>, WarehouseError> {
        Ok(self
            .tables
            .lock()
            .expect("warehouse lock")
            .keys()
            .cloned()
            .collect())
    }

    async fn table_details(&self, table_ref: &str) -> Result<TableDetails, WarehouseError> {
        let table = table_ref
            .rsplit('.')
            .next()
            .unwrap_or(table_ref)
            .to_string();

        let tables = self.tables.lock().expect("warehouse lock");
        let entry = tables
            .get(&table)
            .ok_or_else(|| WarehouseError::TableNotFound(table_ref.to_string()))?;

        Ok(TableDetails {
            table_id: table_ref.to_string(),
            num_rows: entry.rows.len() as u64,
            columns: entry.schema.clone(),
            created: entry.created,
        })
    }

    async fn query(&self, sql: &str) -> Result<Vec<Value>, WarehouseError> {
        let tables = self.tables.lock().expect("warehouse lock");
        for (name, table) in tables.iter() {
            if sql.contains(name.as_str()) {
                return Ok(table.rows.clone());
            }
        }
        Err(WarehouseError::Api {
            status: 404,
            message: format!("Not found: no stored table referenced by query '{}'", sql),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new("test-bucket");
        store
            .upload("datasets/a.json", b"{}", "application/json")
            .await
            .expect("upload");

        let bytes = store.download("datasets/a.json").await.expect("download");
        assert_eq!(bytes, b"{}");

        let listed = store.list("datasets/").await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].size_bytes, 2);

        assert!(matches!(
            store.download("datasets/missing.json").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_warehouse_insert_and_details() {
        let wh = MemoryWarehouse::new("proj", "ds");
        wh.ensure_dataset().await.expect("ensure");
        wh.create_table("t1", &[ColumnSpec::string("sample_id")])
            .await
            .expect("create");
        wh.insert_rows("t1", &[json!({"sample_id": "a"})])
            .await
            .expect("insert");

        let details = wh.table_details("proj.ds.t1").await.expect("details");
        assert_eq!(details.num_rows, 1);
        assert_eq!(details.columns.len(), 1);
        assert_eq!(wh.list_tables().await.expect("list"), vec!["t1"]);
    }

    #[tokio::test]
    async fn test_memory_warehouse_simulated_failure() {
        let wh = MemoryWarehouse::new("proj", "ds");
        wh.create_table("t1", &[]).await.expect("create");
        wh.fail_next_inserts(true);

        let result = wh.insert_rows("t1", &[json!({})]).await;
        assert!(matches!(result, Err(WarehouseError::InsertFailed(_))));
        assert_eq!(wh.row_count("t1"), 0);
    }
}
