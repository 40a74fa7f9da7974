//! # Digit Ensemble Common Library
//!
//! Shared code for the digit ensemble crates:
//! - Configuration model and config file resolution
//! - Display events and the broadcast event bus
//! - Common error type

pub mod config;
pub mod error;
pub mod events;

pub use config::{CaptureSettings, EnsembleConfig, LoggingConfig, ModeStrategy, ModelConfig};
pub use error::{Error, Result};
pub use events::{DisplayEvent, EngineState, EventBus};
