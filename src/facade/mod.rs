//! Read-side access to persisted datasets.
//!
//! Every operation here is a single-shot, stateless, best-effort call: list
//! stored dataset blobs, list warehouse tables, inspect a table's schema,
//! run a query, or load a stored dataset document back. No retries are
//! attempted; failures become typed [`FacadeError`]s, with common query
//! failures classified into more specific messages.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::LabConfig;
use crate::error::{FacadeError, StorageError, WarehouseError};
use crate::persist::DatasetEnvelope;
use crate::storage::{
    BigQueryWarehouse, GcsStore, ObjectStore, TableDetails, Warehouse,
};

/// Maximum rows returned by [`LabFacade::execute_sql`].
pub const MAX_QUERY_ROWS: usize = 100;

/// One stored dataset blob.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetEntry {
    /// File name (last path segment of the key).
    pub name: String,
    /// Full `gs://bucket/key` URI.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Creation timestamp, when reported.
    pub created: Option<DateTime<Utc>>,
}

/// Listing of stored dataset blobs.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetListing {
    /// Bucket that was listed.
    pub bucket: String,
    /// Number of datasets found.
    pub dataset_count: usize,
    /// The datasets.
    pub datasets: Vec<DatasetEntry>,
}

/// Listing of warehouse tables.
#[derive(Debug, Clone, Serialize)]
pub struct TableListing {
    /// Fully-qualified `project.dataset` reference.
    pub dataset: String,
    /// Number of tables.
    pub table_count: usize,
    /// Table names.
    pub tables: Vec<String>,
}

/// Result rows from a query, capped at [`MAX_QUERY_ROWS`].
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutput {
    /// Total rows the query produced before capping.
    pub row_count: usize,
    /// Up to [`MAX_QUERY_ROWS`] result rows.
    pub rows: Vec<Value>,
    /// Whether rows were dropped by the cap.
    pub truncated: bool,
}

/// Read-side facade over the configured backends.
pub struct LabFacade {
    config: LabConfig,
    blob: Option<Arc<dyn ObjectStore>>,
    warehouse: Option<Arc<dyn Warehouse>>,
}

impl LabFacade {
    /// Creates a facade over explicit (possibly absent) backend handles.
    pub fn new(
        config: LabConfig,
        blob: Option<Arc<dyn ObjectStore>>,
        warehouse: Option<Arc<dyn Warehouse>>,
    ) -> Self {
        Self {
            config,
            blob,
            warehouse,
        }
    }

    /// Builds HTTP-backed handles from the configuration.
    pub fn from_config(config: LabConfig) -> Self {
        let token = config.access_token.clone().unwrap_or_default();

        let blob: Option<Arc<dyn ObjectStore>> = config
            .bucket
            .as_ref()
            .map(|bucket| Arc::new(GcsStore::new(bucket, &token)) as Arc<dyn ObjectStore>);

        let warehouse: Option<Arc<dyn Warehouse>> = config.project.as_ref().map(|project| {
            Arc::new(BigQueryWarehouse::new(
                project,
                &config.dataset,
                &config.location,
                &token,
            )) as Arc<dyn Warehouse>
        });

        Self::new(config, blob, warehouse)
    }

    fn require_blob(&self) -> Result<&dyn ObjectStore, FacadeError> {
        self.blob.as_deref().ok_or_else(|| {
            FacadeError::NotConfigured(
                "No data bucket configured. Set the AGENT_DATA_BUCKET environment variable."
                    .to_string(),
            )
        })
    }

    fn require_warehouse(&self) -> Result<&dyn Warehouse, FacadeError> {
        self.warehouse.as_deref().ok_or_else(|| {
            FacadeError::NotConfigured(
                "No BigQuery project configured. Set the GOOGLE_CLOUD_PROJECT environment variable."
                    .to_string(),
            )
        })
    }

    /// Lists stored dataset documents under the configured blob prefix.
    ///
    /// Only `.json` objects are reported; anything else under the prefix is
    /// ignored.
    pub async fn list_datasets(&self) -> Result<DatasetListing, FacadeError> {
        let store = self.require_blob()?;
        let blobs = store.list(&self.config.blob_prefix).await?;

        let datasets: Vec<DatasetEntry> = blobs
            .into_iter()
            .filter(|blob| blob.name.ends_with(".json"))
            .map(|blob| DatasetEntry {
                name: blob
                    .name
                    .rsplit('/')
                    .next()
                    .unwrap_or(blob.name.as_str())
                    .to_string(),
                path: format!("gs://{}/{}", store.bucket(), blob.name),
                size_bytes: blob.size_bytes,
                created: blob.created,
            })
            .collect();

        Ok(DatasetListing {
            bucket: store.bucket().to_string(),
            dataset_count: datasets.len(),
            datasets,
        })
    }

    /// Downloads and parses a stored dataset document.
    ///
    /// The path must be a `gs://bucket/key` URI for the configured bucket;
    /// a malformed path is rejected locally without any backend call.
    pub async fn load_dataset(&self, gs_path: &str) -> Result<DatasetEnvelope, FacadeError> {
        let (bucket, key) = parse_gs_path(gs_path)?;
        let store = self.require_blob()?;

        if bucket != store.bucket() {
            return Err(FacadeError::NotConfigured(format!(
                "Configured store serves bucket '{}', not '{}'",
                store.bucket(),
                bucket
            )));
        }

        let bytes = match store.download(key).await {
            Err(StorageError::NotFound(key)) => return Err(FacadeError::NotFound(key)),
            other => other?,
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Lists tables in the configured warehouse dataset.
    pub async fn list_tables(&self) -> Result<TableListing, FacadeError> {
        let warehouse = self.require_warehouse()?;
        let tables = warehouse.list_tables().await?;

        Ok(TableListing {
            dataset: self
                .config
                .dataset_ref()
                .unwrap_or_else(|| self.config.dataset.clone()),
            table_count: tables.len(),
            tables,
        })
    }

    /// Fetches schema and row count for a table.
    ///
    /// Accepts either a bare table name, resolved against the configured
    /// project and dataset, or a fully-qualified `project.dataset.table`
    /// path (useful for public reference datasets).
    pub async fn table_info(&self, name: &str) -> Result<TableDetails, FacadeError> {
        let warehouse = self.require_warehouse()?;

        let table_ref = if name.matches('.').count() >= 2 {
            name.to_string()
        } else {
            warehouse.table_ref(name)
        };

        match warehouse.table_details(&table_ref).await {
            Err(WarehouseError::TableNotFound(t)) => Err(FacadeError::NotFound(t)),
            other => Ok(other?),
        }
    }

    /// Runs a query and returns up to [`MAX_QUERY_ROWS`] rows.
    ///
    /// Common backend failures (permission denied, not found, malformed
    /// query) are classified into specific error variants with actionable
    /// messages.
    pub async fn execute_sql(&self, sql: &str) -> Result<QueryOutput, FacadeError> {
        let warehouse = self.require_warehouse()?;

        let mut rows = match warehouse.query(sql).await {
            Ok(rows) => rows,
            Err(e) => return Err(classify_query_error(e)),
        };

        let row_count = rows.len();
        let truncated = row_count > MAX_QUERY_ROWS;
        rows.truncate(MAX_QUERY_ROWS);

        tracing::debug!(row_count, truncated, "query executed");
        Ok(QueryOutput {
            row_count,
            rows,
            truncated,
        })
    }
}

/// Splits a `gs://bucket/key` URI into bucket and key.
fn parse_gs_path(gs_path: &str) -> Result<(&str, &str), FacadeError> {
    let rest = gs_path
        .strip_prefix("gs://")
        .ok_or_else(|| FacadeError::InvalidPath(gs_path.to_string()))?;

    match rest.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok((bucket, key)),
        _ => Err(FacadeError::InvalidPath(gs_path.to_string())),
    }
}

/// Maps query-path backend failures to the specific facade variants.
fn classify_query_error(error: WarehouseError) -> FacadeError {
    if let WarehouseError::Api { status, message } = &error {
        if *status == 403 || message.contains("Access Denied") {
            return FacadeError::PermissionDenied(message.clone());
        }
        if *status == 404 || message.contains("Not found") {
            return FacadeError::NotFound(message.clone());
        }
        if *status == 400 {
            return FacadeError::InvalidQuery(message.clone());
        }
    }
    FacadeError::Warehouse(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ColumnSpec, MemoryStore, MemoryWarehouse};
    use serde_json::json;

    fn facade_with(
        blob: Option<Arc<dyn ObjectStore>>,
        warehouse: Option<Arc<dyn Warehouse>>,
    ) -> LabFacade {
        let config = LabConfig::default()
            .with_bucket("test-bucket")
            .with_project("proj");
        LabFacade::new(config, blob, warehouse)
    }

    #[test]
    fn test_parse_gs_path() {
        assert_eq!(
            parse_gs_path("gs://bucket/datasets/a.json").expect("ok"),
            ("bucket", "datasets/a.json")
        );
        assert!(parse_gs_path("s3://bucket/key").is_err());
        assert!(parse_gs_path("gs://bucket").is_err());
        assert!(parse_gs_path("gs:///key").is_err());
    }

    #[test]
    fn test_classify_query_error() {
        let e = classify_query_error(WarehouseError::Api {
            status: 403,
            message: "forbidden".to_string(),
        });
        assert!(matches!(e, FacadeError::PermissionDenied(_)));

        let e = classify_query_error(WarehouseError::Api {
            status: 404,
            message: "missing".to_string(),
        });
        assert!(matches!(e, FacadeError::NotFound(_)));

        let e = classify_query_error(WarehouseError::Api {
            status: 400,
            message: "syntax".to_string(),
        });
        assert!(matches!(e, FacadeError::InvalidQuery(_)));

        let e = classify_query_error(WarehouseError::Api {
            status: 500,
            message: "Access Denied by policy".to_string(),
        });
        assert!(matches!(e, FacadeError::PermissionDenied(_)));

        let e = classify_query_error(WarehouseError::InsertFailed("x".to_string()));
        assert!(matches!(e, FacadeError::Warehouse(_)));
    }

    #[tokio::test]
    async fn test_list_datasets_filters_non_json() {
        let store = Arc::new(MemoryStore::new("test-bucket"));
        store
            .upload("datasets/a.json", b"{}", "application/json")
            .await
            .expect("upload");
        store
            .upload("datasets/readme.txt", b"notes", "text/plain")
            .await
            .expect("upload");

        let facade = facade_with(Some(store), None);
        let listing = facade.list_datasets().await.expect("list");

        assert_eq!(listing.dataset_count, 1);
        assert_eq!(listing.datasets[0].name, "a.json");
        assert_eq!(listing.datasets[0].path, "gs://test-bucket/datasets/a.json");
    }

    #[tokio::test]
    async fn test_list_datasets_without_bucket_is_config_error() {
        let facade = LabFacade::new(LabConfig::default(), None, None);
        let result = facade.list_datasets().await;
        assert!(matches!(result, Err(FacadeError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_load_dataset_rejects_malformed_path_locally() {
        let facade = facade_with(None, None);
        // Malformed path fails before the missing store is ever consulted.
        let result = facade.load_dataset("/tmp/a.json").await;
        assert!(matches!(result, Err(FacadeError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_table_info_resolves_bare_names() {
        let warehouse = Arc::new(MemoryWarehouse::new("proj", "research_agent_data"));
        warehouse
            .create_table("genomics_t", &[ColumnSpec::string("sample_id")])
            .await
            .expect("create");

        let facade = facade_with(None, Some(warehouse));
        let details = facade.table_info("genomics_t").await.expect("info");
        assert_eq!(details.table_id, "proj.research_agent_data.genomics_t");

        let missing = facade.table_info("nope").await;
        assert!(matches!(missing, Err(FacadeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_execute_sql_caps_at_100_rows() {
        let warehouse = Arc::new(MemoryWarehouse::new("proj", "ds"));
        warehouse.create_table("big_table", &[]).await.expect("create");
        let rows: Vec<Value> = (0..150).map(|i| json!({"n": i})).collect();
        warehouse.insert_rows("big_table", &rows).await.expect("insert");

        let facade = facade_with(None, Some(warehouse));
        let output = facade
            .execute_sql("SELECT * FROM big_table")
            .await
            .expect("query");

        assert_eq!(output.row_count, 150);
        assert_eq!(output.rows.len(), MAX_QUERY_ROWS);
        assert!(output.truncated);
    }

    #[tokio::test]
    async fn test_execute_sql_without_project_is_config_error() {
        let facade = facade_with(None, None);
        let result = facade.execute_sql("SELECT 1").await;
        assert!(matches!(result, Err(FacadeError::NotConfigured(_))));
    }
}
