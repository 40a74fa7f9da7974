//! Core types shared by the fusion engine, classifiers and the controller
//!
//! - [`Frame`]: one image handed to every classifier
//! - [`Prediction`] / [`ClassifierResult`]: one model's raw output for a frame
//! - [`ModelIdentity`]: static identity of one range classifier

use digit_common::ModelConfig;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Classifier score (treated as opaque, nominally 0.0-1.0)
pub type Probability = f64;

/// One (label, probability) pair from a classifier
///
/// Serialized with the field names prediction services return
/// (`className`, `probability`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "className")]
    pub class_name: String,
    pub probability: Probability,
}

impl Prediction {
    pub fn new(class_name: impl Into<String>, probability: Probability) -> Self {
        Self {
            class_name: class_name.into(),
            probability,
        }
    }
}

/// One model's raw output for one frame, one entry per trained label
///
/// Probabilities need not sum to 1. Created per inference call, never mutated.
pub type ClassifierResult = Vec<Prediction>;

/// Static identity of a range classifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelIdentity {
    /// Model key (e.g. "model1")
    pub key: String,
    /// Covered range display string (e.g. "1~3")
    pub range: String,
    /// Label meaning "none of my digits"
    pub rejection_label: String,
}

impl ModelIdentity {
    pub fn new(
        key: impl Into<String>,
        range: impl Into<String>,
        rejection_label: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            range: range.into(),
            rejection_label: rejection_label.into(),
        }
    }

    pub fn from_config(key: &str, config: &ModelConfig) -> Self {
        Self::new(key, config.range.clone(), config.rejection_label.clone())
    }

    /// Whether `label` is this model's rejection sentinel
    pub fn is_rejection(&self, label: &str) -> bool {
        label == self.rejection_label
    }
}

/// Where a frame came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOrigin {
    /// Pulled from the capture device (sequence number since device setup)
    Capture { sequence: u64 },
    /// Decoded from a user upload
    Upload,
}

/// Image handed to the classifiers
///
/// Cloning is cheap: the pixel data is shared.
#[derive(Debug, Clone)]
pub struct Frame {
    image: Arc<DynamicImage>,
    origin: FrameOrigin,
}

impl Frame {
    pub fn new(image: DynamicImage, origin: FrameOrigin) -> Self {
        Self {
            image: Arc::new(image),
            origin,
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn origin(&self) -> FrameOrigin {
        self.origin
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
