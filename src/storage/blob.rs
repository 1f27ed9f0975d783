//! Blob object storage: trait and GCS JSON API implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

const GCS_API_BASE: &str = "https://storage.googleapis.com/storage/v1";
const GCS_UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";

/// Metadata for one stored blob.
#[derive(Debug, Clone, Serialize)]
pub struct BlobMeta {
    /// Object key within the bucket.
    pub name: String,
    /// Object size in bytes.
    pub size_bytes: u64,
    /// Creation timestamp, when the backend reports one.
    pub created: Option<DateTime<Utc>>,
}

/// Capability to store and retrieve bytes under bucket + key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// The bucket this store writes to.
    fn bucket(&self) -> &str;

    /// Uploads `bytes` under `key`, replacing any existing object.
    async fn upload(&self, key: &str, bytes: &[u8], content_type: &str)
        -> Result<(), StorageError>;

    /// Downloads the object stored under `key`.
    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Lists objects whose keys start with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, StorageError>;
}

/// GCS-backed object store using the JSON API with bearer-token auth.
pub struct GcsStore {
    client: Client,
    bucket: String,
    token: String,
}

impl GcsStore {
    /// Creates a store for `bucket`, authenticating with `token`.
    pub fn new(bucket: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            bucket: bucket.into(),
            token: token.into(),
        }
    }

    async fn error_from(resp: reqwest::Response) -> StorageError {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        StorageError::Api { status, message }
    }
}

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    size: Option<String>,
    #[serde(rename = "timeCreated")]
    time_created: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<ObjectResource>,
}

#[async_trait]
impl ObjectStore for GcsStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = format!(
            "{}/b/{}/o?uploadType=media&name={}",
            GCS_UPLOAD_BASE,
            self.bucket,
            urlencoding::encode(key)
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Content-Type", content_type)
            .body(bytes.to_vec())
            .send()
            .await?;

        if resp.status().is_success() {
            tracing::info!(bucket = %self.bucket, key, size = bytes.len(), "uploaded blob");
            Ok(())
        } else {
            Err(Self::error_from(resp).await)
        }
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let url = format!(
            "{}/b/{}/o/{}?alt=media",
            GCS_API_BASE,
            self.bucket,
            urlencoding::encode(key)
        );

        let resp = self.client.get(&url).bearer_auth(&self.token).send().await?;

        if resp.status().as_u16() == 404 {
            return Err(StorageError::NotFound(key.to_string()));
        }
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        Ok(resp.bytes().await?.to_vec())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, StorageError> {
        let url = format!(
            "{}/b/{}/o?prefix={}",
            GCS_API_BASE,
            self.bucket,
            urlencoding::encode(prefix)
        );

        let resp = self.client.get(&url).bearer_auth(&self.token).send().await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let listing: ListResponse = resp.json().await?;
        Ok(listing
            .items
            .into_iter()
            .map(|item| BlobMeta {
                name: item.name,
                // The JSON API reports sizes as decimal strings.
                size_bytes: item
                    .size
                    .as_deref()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0),
                created: item.time_created,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_reports_bucket() {
        let store = GcsStore::new("research-data", "test-token");
        assert_eq!(store.bucket(), "research-data");
    }

    #[test]
    fn test_list_response_parses_sizes() {
        let json = r#"{"items":[{"name":"datasets/a.json","size":"2048","timeCreated":"2026-01-05T12:00:00Z"}]}"#;
        let listing: ListResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].name, "datasets/a.json");
        assert_eq!(listing.items[0].size.as_deref(), Some("2048"));
        assert!(listing.items[0].time_created.is_some());
    }

    #[test]
    fn test_list_response_tolerates_empty_bucket() {
        let listing: ListResponse = serde_json::from_str("{}").expect("parse");
        assert!(listing.items.is_empty());
    }
}
