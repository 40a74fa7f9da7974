// Capture seam - the frame source behind capture mode
//
// A connector acquires a device once (lazily, on first start). The device is
// then paused and resumed across stop/start cycles and only released when
// the session ends.

pub mod directory;

pub use directory::{DirectoryCapture, DirectoryConnector};

use crate::error::Result;
use crate::types::Frame;
use async_trait::async_trait;
use digit_common::CaptureSettings;

/// An acquired frame source
#[async_trait]
pub trait CaptureDevice: Send {
    /// Begin or resume delivering frames
    ///
    /// # Errors
    /// `Error::DeviceUnavailable` if the device cannot deliver frames
    async fn play(&mut self) -> Result<()>;

    /// Pause delivery; the device stays acquired
    fn stop(&mut self);

    /// Whether the device is currently delivering frames
    fn is_playing(&self) -> bool;

    /// Most recent frame
    async fn current_frame(&mut self) -> Result<Frame>;
}

/// Acquires capture devices
#[async_trait]
pub trait CaptureConnector: Send + Sync {
    /// Acquire a device configured by `settings`
    ///
    /// # Errors
    /// `Error::DeviceUnavailable` if no device can be acquired
    async fn setup(&self, settings: &CaptureSettings) -> Result<Box<dyn CaptureDevice>>;
}
