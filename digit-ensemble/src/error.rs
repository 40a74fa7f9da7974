//! Error types for digit-ensemble
//!
//! Every variant maps to one user-facing status line (see
//! [`crate::status::StatusMessage`]); the controller performs that
//! conversion at the boundary of the operation that failed.

use crate::status::StatusMessage;
use thiserror::Error;

/// Main error type for digit-ensemble
#[derive(Error, Debug)]
pub enum Error {
    /// Model descriptor or label metadata could not be loaded (fatal to startup)
    #[error("Failed to load model '{model}': {reason}")]
    ModelLoad { model: String, reason: String },

    /// Capture device could not be acquired or started
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A classifier failed on one frame (transient)
    #[error("Inference failed for model '{model}': {reason}")]
    Inference { model: String, reason: String },

    /// Uploaded image could not be decoded (transient)
    #[error("Image decode error: {0}")]
    Decode(String),

    /// digit-common error
    #[error("Common error: {0}")]
    Common(#[from] digit_common::Error),
}

impl Error {
    pub fn model_load(model: impl Into<String>, reason: impl ToString) -> Self {
        Error::ModelLoad {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    pub fn inference(model: impl Into<String>, reason: impl ToString) -> Self {
        Error::Inference {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    /// Status line shown to the user for this failure
    pub fn status_message(&self) -> StatusMessage {
        match self {
            Error::ModelLoad { .. } | Error::Common(_) => StatusMessage::ModelLoadFailed,
            Error::DeviceUnavailable(_) => StatusMessage::CaptureUnavailable,
            Error::Inference { .. } => StatusMessage::PredictionFailed,
            Error::Decode(_) => StatusMessage::DecodeFailed,
        }
    }
}

/// Convenience Result type using digit-ensemble Error
pub type Result<T> = std::result::Result<T, Error>;
