//! User-facing status lines published to the display sink

use crate::fusion::ArbitratedOutcome;
use crate::types::Probability;
use std::fmt;

/// Every line the display can show
#[derive(Debug, Clone, PartialEq)]
pub enum StatusMessage {
    LoadingModels,
    ModelLoadFailed,
    StartingCapture,
    CaptureUnavailable,
    CaptureStopped,
    AnalyzingImage,
    /// No model claimed the frame
    Searching,
    Detected {
        label: String,
        range: String,
        probability: Probability,
    },
    PredictionFailed,
    /// Capture could not be entered from single-image mode
    ModeSwitchFailed,
    DecodeFailed,
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::LoadingModels => write!(f, "Loading models..."),
            StatusMessage::ModelLoadFailed => write!(f, "Failed to load models. Please reload."),
            StatusMessage::StartingCapture => write!(f, "Starting camera..."),
            StatusMessage::CaptureUnavailable => write!(f, "Unable to start the camera."),
            StatusMessage::CaptureStopped => write!(f, "Camera stopped"),
            StatusMessage::AnalyzingImage => write!(f, "Analyzing image..."),
            StatusMessage::Searching => write!(f, "Searching for a digit..."),
            StatusMessage::Detected {
                label,
                range,
                probability,
            } => write!(
                f,
                "Detected digit: {} ({} range, {:.1}%)",
                label,
                range,
                probability * 100.0
            ),
            StatusMessage::PredictionFailed => write!(f, "An error occurred during prediction."),
            StatusMessage::ModeSwitchFailed => write!(f, "Failed to switch to camera mode."),
            StatusMessage::DecodeFailed => write!(f, "Unable to read the uploaded image."),
        }
    }
}

impl From<&ArbitratedOutcome> for StatusMessage {
    fn from(outcome: &ArbitratedOutcome) -> Self {
        match outcome.detection() {
            Some(d) => StatusMessage::Detected {
                label: d.label.clone(),
                range: d.model.range.clone(),
                probability: d.probability,
            },
            None => StatusMessage::Searching,
        }
    }
}
