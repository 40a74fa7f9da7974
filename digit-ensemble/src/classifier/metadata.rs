// Model descriptor and label metadata files

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Input edge length used when the metadata does not say
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// Label metadata (metadata.json)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    /// Trained labels in output order
    pub labels: Vec<String>,
    /// Square input edge length in pixels
    #[serde(default)]
    pub image_size: Option<u32>,
    #[serde(default)]
    pub model_name: Option<String>,
}

impl ModelMetadata {
    /// Parse metadata for model `key`
    pub fn parse(key: &str, json: &str) -> Result<Self> {
        let metadata: Self = serde_json::from_str(json)
            .map_err(|e| Error::model_load(key, format!("malformed metadata: {}", e)))?;

        if metadata.labels.is_empty() {
            return Err(Error::model_load(key, "metadata lists no labels"));
        }
        if metadata.image_size == Some(0) {
            return Err(Error::model_load(key, "metadata imageSize must be non-zero"));
        }

        Ok(metadata)
    }

    pub fn image_size(&self) -> u32 {
        self.image_size.unwrap_or(DEFAULT_IMAGE_SIZE)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Model descriptor (model.json)
///
/// Only checked for shape; the weights themselves live with the prediction
/// service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub generated_by: Option<String>,
    #[serde(default)]
    pub weights_manifest: Vec<serde_json::Value>,
}

impl ModelDescriptor {
    /// Parse a descriptor for model `key`; it must be a JSON object
    pub fn parse(key: &str, json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Error::model_load(key, format!("malformed model descriptor: {}", e)))?;

        if !value.is_object() {
            return Err(Error::model_load(key, "model descriptor must be a JSON object"));
        }

        serde_json::from_value(value)
            .map_err(|e| Error::model_load(key, format!("malformed model descriptor: {}", e)))
    }
}

/// Read and parse metadata.json
pub async fn read_metadata(key: &str, path: &Path) -> Result<ModelMetadata> {
    let json = read_file(key, path).await?;
    ModelMetadata::parse(key, &json)
}

/// Read and parse model.json
pub async fn read_descriptor(key: &str, path: &Path) -> Result<ModelDescriptor> {
    let json = read_file(key, path).await?;
    ModelDescriptor::parse(key, &json)
}

async fn read_file(key: &str, path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::model_load(key, format!("cannot read {}: {}", path.display(), e)))
}
