//! Remote classifier - HTTP prediction service client
//!
//! Each range model is served by a prediction endpoint. The client resizes
//! the frame to the model's input size, PNG-encodes it and posts it as
//! base64; the service answers with one `{className, probability}` entry per
//! trained label.
//!
//! # Request
//! ```json
//! {"model": "model2", "image": "iVBORw0KGgo..."}
//! ```
//!
//! # Response
//! ```json
//! [{"className": "4", "probability": 0.61}, {"className": "이외", "probability": 0.22}]
//! ```

use super::metadata::{read_descriptor, read_metadata, ModelMetadata};
use super::{ClassifierLoader, ImageClassifier};
use crate::error::{Error, Result};
use crate::types::{ClassifierResult, Frame};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use digit_common::ModelConfig;
use image::imageops::FilterType;
use image::ImageFormat;
use reqwest::{Client, Url};
use serde::Serialize;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for prediction requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct PredictRequest<'a> {
    model: &'a str,
    image: String,
}

/// Loads [`RemoteClassifier`]s
pub struct RemoteClassifierLoader {
    http_client: Client,
}

impl RemoteClassifierLoader {
    /// Create a loader with the default request timeout
    pub fn new() -> Result<Self> {
        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| {
                digit_common::Error::Internal(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self::with_client(http_client))
    }

    /// Create a loader sharing an existing HTTP client
    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl ClassifierLoader for RemoteClassifierLoader {
    async fn load(&self, key: &str, config: &ModelConfig) -> Result<Box<dyn ImageClassifier>> {
        let metadata = read_metadata(key, &config.metadata).await?;
        let descriptor = read_descriptor(key, &config.model).await?;

        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::model_load(key, "no prediction endpoint configured"))?;
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::model_load(key, format!("invalid endpoint '{}': {}", endpoint, e)))?;

        info!(
            model = key,
            labels = metadata.labels.len(),
            format = descriptor.format.as_deref().unwrap_or("unknown"),
            endpoint = %endpoint,
            "Model loaded"
        );

        Ok(Box::new(RemoteClassifier {
            key: key.to_string(),
            endpoint,
            metadata,
            http_client: self.http_client.clone(),
        }))
    }
}

/// Classifier backed by an HTTP prediction endpoint
pub struct RemoteClassifier {
    key: String,
    endpoint: Url,
    metadata: ModelMetadata,
    http_client: Client,
}

impl RemoteClassifier {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl ImageClassifier for RemoteClassifier {
    fn labels(&self) -> &[String] {
        &self.metadata.labels
    }

    async fn predict(&self, frame: &Frame) -> Result<ClassifierResult> {
        let png = encode_input(&self.key, frame, self.metadata.image_size()).await?;

        let request = PredictRequest {
            model: &self.key,
            image: STANDARD.encode(png),
        };

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::inference(&self.key, format!("request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::inference(&self.key, format!("service error: {}", e)))?;

        let predictions: ClassifierResult = response
            .json()
            .await
            .map_err(|e| Error::inference(&self.key, format!("malformed response: {}", e)))?;

        for prediction in &predictions {
            if !self.metadata.has_label(&prediction.class_name) {
                warn!(
                    model = %self.key,
                    label = %prediction.class_name,
                    "Service returned a label missing from metadata"
                );
            }
        }

        debug!(model = %self.key, entries = predictions.len(), "Prediction received");
        Ok(predictions)
    }
}

/// Resize to the model input size and PNG-encode off the async runtime
async fn encode_input(key: &str, frame: &Frame, size: u32) -> Result<Vec<u8>> {
    let frame = frame.clone();
    tokio::task::spawn_blocking(move || {
        let resized = frame.image().resize_exact(size, size, FilterType::Triangle);
        let mut buffer = Cursor::new(Vec::new());
        resized
            .write_to(&mut buffer, ImageFormat::Png)
            .map(|_| buffer.into_inner())
            .map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| Error::inference(key, format!("encode task failed: {}", e)))?
    .map_err(|e| Error::inference(key, format!("encode failed: {}", e)))
}
