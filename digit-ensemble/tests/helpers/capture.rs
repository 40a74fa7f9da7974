//! Capture devices with observable lifecycles

use async_trait::async_trait;
use digit_common::CaptureSettings;
use digit_ensemble::capture::{CaptureConnector, CaptureDevice};
use digit_ensemble::{Error, Frame, FrameOrigin, Result};
use image::DynamicImage;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared view of what the scripted connector and its devices did
#[derive(Default)]
pub struct DeviceCounters {
    pub setups: AtomicUsize,
    pub plays: AtomicUsize,
    pub stops: AtomicUsize,
    pub frames: AtomicU64,
    pub fail_setup: AtomicBool,
    pub fail_frames: AtomicBool,
}

impl DeviceCounters {
    pub fn setups(&self) -> usize {
        self.setups.load(Ordering::SeqCst)
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn set_fail_setup(&self, fail: bool) {
        self.fail_setup.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_frames(&self, fail: bool) {
        self.fail_frames.store(fail, Ordering::SeqCst);
    }
}

pub struct ScriptedConnector {
    counters: Arc<DeviceCounters>,
}

impl ScriptedConnector {
    pub fn new() -> (Self, Arc<DeviceCounters>) {
        let counters = Arc::new(DeviceCounters::default());
        (
            Self {
                counters: Arc::clone(&counters),
            },
            counters,
        )
    }

    /// Connector whose setup always fails until the counters say otherwise
    pub fn unavailable() -> (Self, Arc<DeviceCounters>) {
        let (connector, counters) = Self::new();
        counters.set_fail_setup(true);
        (connector, counters)
    }
}

#[async_trait]
impl CaptureConnector for ScriptedConnector {
    async fn setup(&self, settings: &CaptureSettings) -> Result<Box<dyn CaptureDevice>> {
        if self.counters.fail_setup.load(Ordering::SeqCst) {
            return Err(Error::DeviceUnavailable("permission denied".to_string()));
        }
        self.counters.setups.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedDevice {
            counters: Arc::clone(&self.counters),
            width: settings.width,
            height: settings.height,
            playing: false,
        }))
    }
}

struct ScriptedDevice {
    counters: Arc<DeviceCounters>,
    width: u32,
    height: u32,
    playing: bool,
}

#[async_trait]
impl CaptureDevice for ScriptedDevice {
    async fn play(&mut self) -> Result<()> {
        self.counters.plays.fetch_add(1, Ordering::SeqCst);
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.counters.stops.fetch_add(1, Ordering::SeqCst);
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    async fn current_frame(&mut self) -> Result<Frame> {
        if self.counters.fail_frames.load(Ordering::SeqCst) {
            return Err(Error::DeviceUnavailable("frame dropped".to_string()));
        }
        let sequence = self.counters.frames.fetch_add(1, Ordering::SeqCst);
        Ok(Frame::new(
            DynamicImage::new_rgb8(self.width, self.height),
            FrameOrigin::Capture { sequence },
        ))
    }
}
