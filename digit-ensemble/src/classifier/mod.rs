// Classifier seam - the external image-classification service
//
// Each range classifier is loaded once from its descriptor + label metadata
// and then asked for predictions frame by frame.

pub mod metadata;
pub mod remote;

pub use metadata::{ModelDescriptor, ModelMetadata};
pub use remote::{RemoteClassifier, RemoteClassifierLoader};

use crate::error::Result;
use crate::types::{ClassifierResult, Frame};
use async_trait::async_trait;
use digit_common::ModelConfig;

/// A loaded classifier
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Labels the model was trained on (including its rejection label)
    fn labels(&self) -> &[String];

    /// Score one frame
    ///
    /// # Errors
    /// `Error::Inference` if the frame cannot be scored
    async fn predict(&self, frame: &Frame) -> Result<ClassifierResult>;
}

/// Loads classifiers from configuration
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    /// Load the classifier configured under `key`
    ///
    /// # Errors
    /// `Error::ModelLoad` on malformed descriptor/metadata or unreachable service
    async fn load(&self, key: &str, config: &ModelConfig) -> Result<Box<dyn ImageClassifier>>;
}
