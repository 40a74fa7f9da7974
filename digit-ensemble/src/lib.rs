//! digit-ensemble library interface
//!
//! Three range classifiers (1~3, 4~6, 7~9), each able to reject a frame,
//! are fused into one digit decision per frame. Frames come either from a
//! continuously sampled capture device or from single uploaded images.

pub mod capture;
pub mod classifier;
pub mod controller;
pub mod decoder;
pub mod ensemble;
pub mod error;
pub mod fusion;
pub mod logging;
pub mod scheduler;
pub mod session;
pub mod sink;
pub mod status;
pub mod types;

pub use crate::controller::{Mode, SamplingController, TickOutcome};
pub use crate::ensemble::{Ensemble, ModelSlot};
pub use crate::error::{Error, Result};
pub use crate::fusion::{classify_verdict, fuse, ArbitratedOutcome, Detection, ModelVerdict, PerModelVerdict};
pub use crate::session::Session;
pub use crate::sink::{BroadcastSink, ConsoleSink, DisplaySink};
pub use crate::status::StatusMessage;
pub use crate::types::{ClassifierResult, Frame, FrameOrigin, ModelIdentity, Prediction, Probability};
