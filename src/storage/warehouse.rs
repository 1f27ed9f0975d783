//! Tabular warehouse storage: trait and BigQuery REST implementation.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::WarehouseError;

const BQ_API_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// One column of a warehouse table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,
    /// Warehouse type name, e.g. `STRING` or `FLOAT64`.
    #[serde(rename = "type")]
    pub field_type: String,
}

impl ColumnSpec {
    /// A `STRING` column.
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: "STRING".to_string(),
        }
    }

    /// A `FLOAT64` column.
    pub fn float(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: "FLOAT64".to_string(),
        }
    }
}

/// Schema and row count for one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableDetails {
    /// Fully-qualified `project.dataset.table` reference.
    pub table_id: String,
    /// Row count reported by the backend.
    pub num_rows: u64,
    /// Column list in schema order.
    pub columns: Vec<ColumnSpec>,
    /// Creation timestamp, when reported.
    pub created: Option<DateTime<Utc>>,
}

/// Capability to manage tables and run queries against a tabular backend.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Fully-qualified reference for a table in the configured dataset.
    fn table_ref(&self, table: &str) -> String;

    /// Ensures the configured dataset exists; idempotent.
    async fn ensure_dataset(&self) -> Result<(), WarehouseError>;

    /// Creates a table with the given schema; succeeds if it already exists.
    async fn create_table(&self, table: &str, schema: &[ColumnSpec]) -> Result<(), WarehouseError>;

    /// Bulk-inserts rows (flat JSON objects) into a table.
    async fn insert_rows(&self, table: &str, rows: &[Value]) -> Result<(), WarehouseError>;

    /// Lists table names in the configured dataset.
    async fn list_tables(&self) -> Result<Vec<String>, WarehouseError>;

    /// Fetches schema and row count for a fully-qualified
    /// `project.dataset.table` reference.
    async fn table_details(&self, table_ref: &str) -> Result<TableDetails, WarehouseError>;

    /// Runs a SQL query and returns all result rows as flat JSON objects.
    async fn query(&self, sql: &str) -> Result<Vec<Value>, WarehouseError>;
}

/// BigQuery-backed warehouse using the REST API with bearer-token auth.
pub struct BigQueryWarehouse {
    client: Client,
    project: String,
    dataset: String,
    location: String,
    token: String,
}

impl BigQueryWarehouse {
    /// Creates a warehouse client for `project.dataset`.
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        location: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            project: project.into(),
            dataset: dataset.into(),
            location: location.into(),
            token: token.into(),
        }
    }

    async fn error_from(resp: reqwest::Response) -> WarehouseError {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        WarehouseError::Api { status, message }
    }

    fn dataset_url(&self) -> String {
        format!(
            "{}/projects/{}/datasets/{}",
            BQ_API_BASE, self.project, self.dataset
        )
    }
}

#[derive(Debug, Deserialize)]
struct SchemaFields {
    #[serde(default)]
    fields: Vec<ColumnSpec>,
}

#[derive(Debug, Deserialize)]
struct TableResource {
    #[serde(rename = "numRows")]
    num_rows: Option<String>,
    schema: Option<SchemaFields>,
    #[serde(rename = "creationTime")]
    creation_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableListEntry {
    #[serde(rename = "tableReference")]
    table_reference: TableReference,
}

#[derive(Debug, Deserialize)]
struct TableReference {
    #[serde(rename = "tableId")]
    table_id: String,
}

#[derive(Debug, Deserialize)]
struct TableListResponse {
    #[serde(default)]
    tables: Vec<TableListEntry>,
}

#[derive(Debug, Deserialize)]
struct QueryCell {
    v: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(default)]
    f: Vec<QueryCell>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    schema: Option<SchemaFields>,
    #[serde(default)]
    rows: Vec<QueryRow>,
}

#[derive(Debug, Deserialize)]
struct InsertErrorDetail {
    #[serde(default)]
    errors: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    #[serde(rename = "insertErrors")]
    #[serde(default)]
    insert_errors: Vec<InsertErrorDetail>,
}

/// Converts one query cell into a typed JSON value based on the column type.
///
/// The REST API returns every scalar as a string; numeric and boolean
/// columns are parsed back into native JSON types.
fn convert_cell(field_type: &str, cell: Option<Value>) -> Value {
    let raw = match cell {
        Some(Value::String(s)) => s,
        Some(other) => return other,
        None => return Value::Null,
    };

    match field_type {
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::String(raw)),
        "INTEGER" | "INT64" => raw
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or(Value::String(raw)),
        "BOOLEAN" | "BOOL" => match raw.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw),
        },
        _ => Value::String(raw),
    }
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    fn table_ref(&self, table: &str) -> String {
        format!("{}.{}.{}", self.project, self.dataset, table)
    }

    async fn ensure_dataset(&self) -> Result<(), WarehouseError> {
        let resp = self
            .client
            .get(self.dataset_url())
            .bearer_auth(&self.token)
            .send()
            .await?;

        if resp.status().is_success() {
            return Ok(());
        }
        if resp.status().as_u16() != 404 {
            return Err(Self::error_from(resp).await);
        }

        let url = format!("{}/projects/{}/datasets", BQ_API_BASE, self.project);
        let body = json!({
            "datasetReference": {
                "projectId": self.project,
                "datasetId": self.dataset,
            },
            "location": self.location,
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        // 409 means another writer created it first, which is fine.
        if resp.status().is_success() || resp.status().as_u16() == 409 {
            tracing::info!(dataset = %self.dataset, "warehouse dataset ready");
            Ok(())
        } else {
            Err(Self::error_from(resp).await)
        }
    }

    async fn create_table(&self, table: &str, schema: &[ColumnSpec]) -> Result<(), WarehouseError> {
        let url = format!("{}/tables", self.dataset_url());
        let body = json!({
            "tableReference": {
                "projectId": self.project,
                "datasetId": self.dataset,
                "tableId": table,
            },
            "schema": { "fields": schema },
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if resp.status().is_success() || resp.status().as_u16() == 409 {
            Ok(())
        } else {
            Err(Self::error_from(resp).await)
        }
    }

    async fn insert_rows(&self, table: &str, rows: &[Value]) -> Result<(), WarehouseError> {
        let url = format!("{}/tables/{}/insertAll", self.dataset_url(), table);
        let body = json!({
            "rows": rows.iter().map(|row| json!({ "json": row })).collect::<Vec<_>>(),
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let result: InsertResponse = resp.json().await?;
        if result.insert_errors.is_empty() {
            tracing::info!(table, rows = rows.len(), "inserted rows into warehouse");
            Ok(())
        } else {
            let detail = serde_json::to_string(&result.insert_errors[0].errors)
                .unwrap_or_else(|_| "unknown insert error".to_string());
            Err(WarehouseError::InsertFailed(detail))
        }
    }

    async fn list_tables(&self) -> Result<Vec<String>, WarehouseError> {
        let url = format!("{}/tables", self.dataset_url());
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let listing: TableListResponse = resp.json().await?;
        Ok(listing
            .tables
            .into_iter()
            .map(|t| t.table_reference.table_id)
            .collect())
    }

    async fn table_details(&self, table_ref: &str) -> Result<TableDetails, WarehouseError> {
        let parts: Vec<&str> = table_ref.split('.').collect();
        let &[project, dataset, table] = parts.as_slice() else {
            return Err(WarehouseError::InvalidTableRef(table_ref.to_string()));
        };

        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}",
            BQ_API_BASE, project, dataset, table
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if resp.status().as_u16() == 404 {
            return Err(WarehouseError::TableNotFound(table_ref.to_string()));
        }
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let resource: TableResource = resp.json().await?;
        Ok(TableDetails {
            table_id: table_ref.to_string(),
            num_rows: resource
                .num_rows
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            columns: resource.schema.map(|s| s.fields).unwrap_or_default(),
            // creationTime is epoch milliseconds as a decimal string.
            created: resource
                .creation_time
                .as_deref()
                .and_then(|s| s.parse::<i64>().ok())
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        })
    }

    async fn query(&self, sql: &str) -> Result<Vec<Value>, WarehouseError> {
        let url = format!("{}/projects/{}/queries", BQ_API_BASE, self.project);
        let body = json!({ "query": sql, "useLegacySql": false });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let result: QueryResponse = resp.json().await?;
        let columns = result.schema.map(|s| s.fields).unwrap_or_default();

        let rows = result
            .rows
            .into_iter()
            .map(|row| {
                let mut object = serde_json::Map::new();
                for (column, cell) in columns.iter().zip(row.f) {
                    object.insert(
                        column.name.clone(),
                        convert_cell(&column.field_type, cell.v),
                    );
                }
                Value::Object(object)
            })
            .collect();

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_is_fully_qualified() {
        let wh = BigQueryWarehouse::new("my-project", "research_agent_data", "US", "token");
        assert_eq!(
            wh.table_ref("genomics_20260105_abcd1234"),
            "my-project.research_agent_data.genomics_20260105_abcd1234"
        );
    }

    #[test]
    fn test_column_spec_constructors() {
        assert_eq!(ColumnSpec::string("sample_id").field_type, "STRING");
        assert_eq!(ColumnSpec::float("BRCA1").field_type, "FLOAT64");
    }

    #[test]
    fn test_convert_cell_parses_numeric_types() {
        let v = convert_cell("FLOAT64", Some(Value::String("3.125".to_string())));
        assert_eq!(v, json!(3.125));

        let v = convert_cell("INT64", Some(Value::String("42".to_string())));
        assert_eq!(v, json!(42));

        let v = convert_cell("BOOL", Some(Value::String("true".to_string())));
        assert_eq!(v, json!(true));

        let v = convert_cell("STRING", Some(Value::String("Control".to_string())));
        assert_eq!(v, json!("Control"));

        assert_eq!(convert_cell("FLOAT64", None), Value::Null);
    }

    #[test]
    fn test_query_response_shape_parses() {
        let json = r#"{
            "schema": {"fields": [{"name": "sample_id", "type": "STRING"}, {"name": "IL6", "type": "FLOAT64"}]},
            "rows": [{"f": [{"v": "Control_001"}, {"v": "12.5"}]}]
        }"#;
        let parsed: QueryResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(parsed.rows.len(), 1);
        let columns = parsed.schema.expect("schema").fields;
        assert_eq!(columns[1].field_type, "FLOAT64");
    }
}
