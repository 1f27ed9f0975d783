//! Dual-sink dataset persistence.
//!
//! A generated dataset is written to whichever of the two backends are
//! configured: the blob store gets the whole dataset as one indented JSON
//! document, the warehouse gets one row per sample. The sinks are attempted
//! independently; one failing never blocks the other, and there is no
//! cross-sink rollback. Callers must treat the two statuses in
//! [`PersistOutcome`] as independently authoritative.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::LabConfig;
use crate::dataset::GeneratedDataset;
use crate::storage::{
    BigQueryWarehouse, ColumnSpec, GcsStore, ObjectStore, Warehouse,
};

/// Outcome of one sink attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkStatus {
    /// Persisted; `uri` is the blob URI or the `project.dataset.table` ref.
    Saved { uri: String },
    /// Sink not configured, nothing was attempted.
    Skipped,
    /// Sink was attempted and failed.
    Failed { message: String },
}

impl SinkStatus {
    /// Whether this sink persisted the dataset.
    pub fn is_saved(&self) -> bool {
        matches!(self, SinkStatus::Saved { .. })
    }

    /// The persisted URI, if any.
    pub fn uri(&self) -> Option<&str> {
        match self {
            SinkStatus::Saved { uri } => Some(uri),
            _ => None,
        }
    }
}

/// Per-sink results of one persistence call.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistOutcome {
    /// Blob sink result.
    pub blob: SinkStatus,
    /// Warehouse sink result.
    pub warehouse: SinkStatus,
}

impl PersistOutcome {
    /// Blob URI (`gs://bucket/key`), when the blob sink saved.
    pub fn gcs_path(&self) -> Option<&str> {
        self.blob.uri()
    }

    /// Table reference (`project.dataset.table`), when the warehouse saved.
    pub fn table_ref(&self) -> Option<&str> {
        self.warehouse.uri()
    }

    /// Blob sink status string in the stored-document vocabulary.
    pub fn storage_status(&self) -> String {
        match &self.blob {
            SinkStatus::Saved { .. } => "saved_to_gcs".to_string(),
            SinkStatus::Skipped => "not_saved_no_bucket_configured".to_string(),
            SinkStatus::Failed { message } => format!("error: {}", message),
        }
    }

    /// Warehouse sink status string in the stored-document vocabulary.
    pub fn bigquery_status(&self) -> String {
        match &self.warehouse {
            SinkStatus::Saved { .. } => "saved_to_bigquery".to_string(),
            SinkStatus::Skipped => "not_saved_no_project_configured".to_string(),
            SinkStatus::Failed { message } => format!("error: {}", message),
        }
    }
}

/// The JSON document written to the blob sink.
///
/// Field order is part of the wire contract: `status` first, the dataset
/// fields flattened in the middle, the storage fields last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetEnvelope {
    /// Always `"data_generated"`.
    pub status: String,
    /// The dataset itself, flattened into the envelope.
    #[serde(flatten)]
    pub dataset: GeneratedDataset,
    /// Blob URI this document was written to.
    pub gcs_path: Option<String>,
    /// Blob sink status at write time.
    pub storage_status: String,
}

/// Full result of a generate-and-persist call, as rendered to callers.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Always `"data_generated"`.
    pub status: String,
    /// The generated dataset.
    #[serde(flatten)]
    pub dataset: GeneratedDataset,
    /// Blob URI, when the blob sink saved.
    pub gcs_path: Option<String>,
    /// Blob sink status string.
    pub storage_status: String,
    /// Table reference, when the warehouse sink saved.
    pub bigquery_table: Option<String>,
    /// Warehouse sink status string.
    pub bigquery_status: String,
}

impl GenerationReport {
    /// Combines a dataset with its persistence outcome.
    pub fn new(dataset: GeneratedDataset, outcome: &PersistOutcome) -> Self {
        Self {
            status: "data_generated".to_string(),
            gcs_path: outcome.gcs_path().map(String::from),
            storage_status: outcome.storage_status(),
            bigquery_table: outcome.table_ref().map(String::from),
            bigquery_status: outcome.bigquery_status(),
            dataset,
        }
    }
}

/// Writes generated datasets to the configured sinks.
pub struct Persister {
    blob: Option<Arc<dyn ObjectStore>>,
    warehouse: Option<Arc<dyn Warehouse>>,
    blob_prefix: String,
}

impl Persister {
    /// Creates a persister over explicit (possibly absent) sink handles.
    pub fn new(
        blob: Option<Arc<dyn ObjectStore>>,
        warehouse: Option<Arc<dyn Warehouse>>,
        blob_prefix: impl Into<String>,
    ) -> Self {
        Self {
            blob,
            warehouse,
            blob_prefix: blob_prefix.into(),
        }
    }

    /// Builds HTTP-backed sinks from the configuration. Unset backends stay
    /// disabled rather than erroring.
    pub fn from_config(config: &LabConfig) -> Self {
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

        Self::new(blob, warehouse, config.blob_prefix.clone())
    }

    /// Persists a dataset to every configured sink.
    ///
    /// Never fails as a whole: each sink reports its own [`SinkStatus`], and
    /// an unconfigured sink is a skip, not an error.
    pub async fn persist(&self, dataset: &GeneratedDataset) -> PersistOutcome {
        let name = resource_name(&dataset.data_type);

        let blob = match &self.blob {
            Some(store) => self.persist_blob(store.as_ref(), dataset, &name).await,
            None => SinkStatus::Skipped,
        };

        let warehouse = match &self.warehouse {
            Some(wh) => self.persist_warehouse(wh.as_ref(), dataset, &name).await,
            None => SinkStatus::Skipped,
        };

        let outcome = PersistOutcome { blob, warehouse };
        tracing::info!(
            storage_status = %outcome.storage_status(),
            bigquery_status = %outcome.bigquery_status(),
            "persisted dataset"
        );
        outcome
    }

    async fn persist_blob(
        &self,
        store: &dyn ObjectStore,
        dataset: &GeneratedDataset,
        name: &str,
    ) -> SinkStatus {
        let key = format!("{}{}.json", self.blob_prefix, name);
        let uri = format!("gs://{}/{}", store.bucket(), key);

        // The stored document records its own URI, so the key is fixed
        // before upload.
        let envelope = DatasetEnvelope {
            status: "data_generated".to_string(),
            dataset: dataset.clone(),
            gcs_path: Some(uri.clone()),
            storage_status: "saved_to_gcs".to_string(),
        };

        let bytes = match serde_json::to_vec_pretty(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                return SinkStatus::Failed {
                    message: e.to_string(),
                }
            }
        };

        match store.upload(&key, &bytes, "application/json").await {
            Ok(()) => SinkStatus::Saved { uri },
            Err(e) => {
                tracing::warn!(error = %e, key, "blob sink failed");
                SinkStatus::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn persist_warehouse(
        &self,
        warehouse: &dyn Warehouse,
        dataset: &GeneratedDataset,
        name: &str,
    ) -> SinkStatus {
        match self.write_table(warehouse, dataset, name).await {
            Ok(table_ref) => SinkStatus::Saved { uri: table_ref },
            Err(e) => {
                tracing::warn!(error = %e, table = name, "warehouse sink failed");
                SinkStatus::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn write_table(
        &self,
        warehouse: &dyn Warehouse,
        dataset: &GeneratedDataset,
        name: &str,
    ) -> Result<String, crate::error::WarehouseError> {
        warehouse.ensure_dataset().await?;

        let schema = table_schema(&dataset.features);
        warehouse.create_table(name, &schema).await?;

        let rows: Vec<Value> = dataset.data.iter().map(warehouse_row).collect();
        warehouse.insert_rows(name, &rows).await?;

        Ok(warehouse.table_ref(name))
    }
}

/// Unique resource name: domain tag + timestamp + random suffix.
fn resource_name(data_type: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", data_type, timestamp, &suffix[..8])
}

/// Warehouse schema for a dataset: identifier, group, one float per feature.
fn table_schema(features: &[String]) -> Vec<ColumnSpec> {
    let mut schema = vec![
        ColumnSpec::string("sample_id"),
        ColumnSpec::string("group_name"),
    ];
    schema.extend(features.iter().map(ColumnSpec::float));
    schema
}

/// Converts a sample row into its warehouse form.
///
/// The `group` key is renamed to `group_name`; `group` is a reserved word
/// in the query engine.
fn warehouse_row(row: &crate::dataset::SampleRow) -> Value {
    let mut object = serde_json::Map::new();
    object.insert("sample_id".to_string(), json!(row.sample_id));
    object.insert("group_name".to_string(), json!(row.group));
    for (feature, value) in &row.values {
        object.insert(feature.clone(), json!(value));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{GenerationRequest, SampleSynthesizer};
    use crate::storage::{MemoryStore, MemoryWarehouse};

    fn small_dataset() -> GeneratedDataset {
        let request = GenerationRequest::new("genomics")
            .with_samples_per_group(2)
            .with_groups(2)
            .with_noise(false);
        SampleSynthesizer::new(42).generate(&request).expect("ok")
    }

    #[test]
    fn test_resource_name_shape() {
        let name = resource_name("genomics");
        let parts: Vec<&str> = name.split('_').collect();
        assert_eq!(parts[0], "genomics");
        assert_eq!(parts.last().map(|s| s.len()), Some(8));
    }

    #[test]
    fn test_table_schema_columns() {
        let schema = table_schema(&["BRCA1".to_string(), "TP53".to_string()]);
        assert_eq!(schema.len(), 4);
        assert_eq!(schema[0], ColumnSpec::string("sample_id"));
        assert_eq!(schema[1], ColumnSpec::string("group_name"));
        assert_eq!(schema[2], ColumnSpec::float("BRCA1"));
    }

    #[test]
    fn test_warehouse_row_renames_group() {
        let dataset = small_dataset();
        let row = warehouse_row(&dataset.data[0]);
        assert!(row.get("group_name").is_some());
        assert!(row.get("group").is_none());
        assert_eq!(row.get("sample_id").and_then(Value::as_str), Some("Wild_Type_001"));
    }

    #[tokio::test]
    async fn test_both_sinks_unconfigured_is_all_skips() {
        let persister = Persister::new(None, None, "datasets/");
        let outcome = persister.persist(&small_dataset()).await;

        assert_eq!(outcome.blob, SinkStatus::Skipped);
        assert_eq!(outcome.storage_status(), "not_saved_no_bucket_configured");
        assert_eq!(outcome.bigquery_status(), "not_saved_no_project_configured");
    }

    #[tokio::test]
    async fn test_blob_only_configuration() {
        let store = Arc::new(MemoryStore::new("test-bucket"));
        let persister = Persister::new(Some(store.clone()), None, "datasets/");
        let outcome = persister.persist(&small_dataset()).await;

        assert!(outcome.blob.is_saved());
        assert_eq!(outcome.storage_status(), "saved_to_gcs");
        assert!(outcome.gcs_path().expect("uri").starts_with("gs://test-bucket/datasets/"));
        assert_eq!(outcome.bigquery_status(), "not_saved_no_project_configured");
        assert_eq!(store.object_count(), 1);
    }

    #[tokio::test]
    async fn test_warehouse_failure_does_not_affect_blob() {
        let store = Arc::new(MemoryStore::new("test-bucket"));
        let warehouse = Arc::new(MemoryWarehouse::new("proj", "ds"));
        warehouse.fail_next_inserts(true);

        let persister = Persister::new(Some(store.clone()), Some(warehouse), "datasets/");
        let outcome = persister.persist(&small_dataset()).await;

        assert!(outcome.blob.is_saved());
        assert!(outcome.bigquery_status().starts_with("error:"));
        assert_eq!(store.object_count(), 1);
    }

    #[tokio::test]
    async fn test_warehouse_sink_writes_all_rows() {
        let warehouse = Arc::new(MemoryWarehouse::new("proj", "ds"));
        let persister = Persister::new(None, Some(warehouse.clone()), "datasets/");
        let dataset = small_dataset();
        let outcome = persister.persist(&dataset).await;

        let table_ref = outcome.table_ref().expect("table ref");
        assert!(table_ref.starts_with("proj.ds.genomics_"));
        assert!(warehouse.dataset_created());

        let table = table_ref.rsplit('.').next().expect("table name");
        assert_eq!(warehouse.row_count(table), dataset.total_samples);
    }

    #[test]
    fn test_report_field_rendering() {
        let dataset = small_dataset();
        let outcome = PersistOutcome {
            blob: SinkStatus::Saved {
                uri: "gs://b/datasets/x.json".to_string(),
            },
            warehouse: SinkStatus::Failed {
                message: "insert failed".to_string(),
            },
        };

        let report = GenerationReport::new(dataset, &outcome);
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["status"], "data_generated");
        assert_eq!(json["gcs_path"], "gs://b/datasets/x.json");
        assert_eq!(json["bigquery_status"], "error: insert failed");
        assert_eq!(json["total_samples"], 4);
    }
}
