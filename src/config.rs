//! Runtime configuration for persistence and read-side operations.
//!
//! All backend coordinates live in an explicit [`LabConfig`] passed into the
//! persister and facade constructors. Nothing reads ambient process state at
//! call time, so multiple configurations can coexist in one process (and in
//! one test run).

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for dataset persistence and catalog/query access.
///
/// Both backends are optional and independent: a missing bucket or project
/// turns the corresponding sink into a skip, never an error.
#[derive(Debug, Clone)]
pub struct LabConfig {
    /// Blob bucket for whole-dataset JSON documents. `None` disables the
    /// blob sink.
    pub bucket: Option<String>,
    /// Warehouse project id. `None` disables the warehouse sink and the
    /// query surface.
    pub project: Option<String>,
    /// Warehouse dataset (schema) holding generated tables.
    pub dataset: String,
    /// Warehouse location used when the dataset has to be created.
    pub location: String,
    /// Key prefix under which dataset blobs are written and listed.
    pub blob_prefix: String,
    /// OAuth bearer token for the backend REST APIs.
    pub access_token: Option<String>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            project: None,
            dataset: "research_agent_data".to_string(),
            location: "US".to_string(),
            blob_prefix: "datasets/".to_string(),
            access_token: None,
        }
    }
}

impl LabConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AGENT_DATA_BUCKET`: blob bucket name (optional)
    /// - `GOOGLE_CLOUD_PROJECT`: warehouse project id (optional)
    /// - `AGENT_BQ_DATASET`: warehouse dataset (default: research_agent_data)
    /// - `AGENT_BQ_LOCATION`: warehouse location (default: US)
    /// - `GOOGLE_OAUTH_ACCESS_TOKEN`: bearer token for backend calls
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the resulting configuration fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("AGENT_DATA_BUCKET") {
            if !val.is_empty() {
                config.bucket = Some(val);
            }
        }

        if let Ok(val) = std::env::var("GOOGLE_CLOUD_PROJECT") {
            if !val.is_empty() {
                config.project = Some(val);
            }
        }

        if let Ok(val) = std::env::var("AGENT_BQ_DATASET") {
            if !val.is_empty() {
                config.dataset = val;
            }
        }

        if let Ok(val) = std::env::var("AGENT_BQ_LOCATION") {
            if !val.is_empty() {
                config.location = val;
            }
        }

        if let Ok(val) = std::env::var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            if !val.is_empty() {
                config.access_token = Some(val);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "dataset cannot be empty".to_string(),
            ));
        }

        if self.location.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "location cannot be empty".to_string(),
            ));
        }

        if self.blob_prefix.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "blob_prefix cannot be empty".to_string(),
            ));
        }

        if let Some(bucket) = &self.bucket {
            if bucket.is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "bucket cannot be an empty string; leave it unset instead".to_string(),
                ));
            }
        }

        if let Some(project) = &self.project {
            if project.is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "project cannot be an empty string; leave it unset instead".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Builder method to set the blob bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Builder method to set the warehouse project.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Builder method to set the warehouse dataset.
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = dataset.into();
        self
    }

    /// Builder method to set the warehouse location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the blob key prefix.
    pub fn with_blob_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.blob_prefix = prefix.into();
        self
    }

    /// Builder method to set the access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Fully-qualified `project.dataset` reference, if a project is set.
    pub fn dataset_ref(&self) -> Option<String> {
        self.project
            .as_ref()
            .map(|p| format!("{}.{}", p, self.dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LabConfig::default();
        assert!(config.bucket.is_none());
        assert!(config.project.is_none());
        assert_eq!(config.dataset, "research_agent_data");
        assert_eq!(config.location, "US");
        assert_eq!(config.blob_prefix, "datasets/");
    }

    #[test]
    fn test_config_builder() {
        let config = LabConfig::new()
            .with_bucket("research-data")
            .with_project("my-project")
            .with_dataset("experiments")
            .with_location("EU")
            .with_blob_prefix("generated/");

        assert_eq!(config.bucket.as_deref(), Some("research-data"));
        assert_eq!(config.project.as_deref(), Some("my-project"));
        assert_eq!(config.dataset, "experiments");
        assert_eq!(config.location, "EU");
        assert_eq!(config.blob_prefix, "generated/");
    }

    #[test]
    fn test_validation_valid_config() {
        let config = LabConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_dataset() {
        let config = LabConfig::default().with_dataset("");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("dataset"));
    }

    #[test]
    fn test_validation_empty_bucket_string() {
        let config = LabConfig::default().with_bucket("");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("bucket"));
    }

    #[test]
    fn test_validation_empty_prefix() {
        let config = LabConfig::default().with_blob_prefix("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dataset_ref() {
        let config = LabConfig::default().with_project("my-project");
        assert_eq!(
            config.dataset_ref().as_deref(),
            Some("my-project.research_agent_data")
        );

        let config = LabConfig::default();
        assert!(config.dataset_ref().is_none());
    }
}
