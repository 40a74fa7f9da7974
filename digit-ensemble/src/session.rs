//! Mode-selection surface
//!
//! A [`Session`] drives one [`SamplingController`] for a user: it owns the
//! capture loop task and maps user intents (camera button, mode selection,
//! image upload) onto controller transitions according to the configured
//! [`ModeStrategy`].

use crate::controller::{Mode, SamplingController};
use crate::decoder::UploadDecoder;
use crate::error::Result;
use crate::fusion::ArbitratedOutcome;
use crate::scheduler::{spawn_capture_loop, LoopSummary, SharedController};
use crate::status::StatusMessage;
use digit_common::{EngineState, ModeStrategy};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct Session {
    controller: SharedController,
    decoder: UploadDecoder,
    strategy: ModeStrategy,
    tick_interval: Duration,
    /// Loop task and the capture epoch it serves
    capture_loop: Option<(u64, JoinHandle<LoopSummary>)>,
}

impl Session {
    pub fn new(
        controller: SamplingController,
        strategy: ModeStrategy,
        tick_interval: Duration,
    ) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            decoder: UploadDecoder::default(),
            strategy,
            tick_interval,
            capture_loop: None,
        }
    }

    pub fn with_decoder(mut self, decoder: UploadDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn controller(&self) -> SharedController {
        Arc::clone(&self.controller)
    }

    pub fn strategy(&self) -> ModeStrategy {
        self.strategy
    }

    pub async fn state(&self) -> EngineState {
        self.controller.lock().await.state()
    }

    pub async fn mode(&self) -> Mode {
        self.controller.lock().await.mode()
    }

    /// Whether a capture loop task is still running
    pub fn is_loop_running(&self) -> bool {
        self.capture_loop
            .as_ref()
            .map(|(_, handle)| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Start capture and make sure a loop serves the current epoch
    pub async fn start_capture(&mut self) -> Result<()> {
        let epoch = {
            let mut controller = self.controller.lock().await;
            controller.start().await?;
            controller.capture_epoch()
        };
        self.ensure_loop(epoch);
        Ok(())
    }

    /// Stop capture; the loop ends on its next tick
    pub async fn stop_capture(&mut self) {
        self.controller.lock().await.stop();
    }

    /// Select capture or single-image mode
    ///
    /// Failing to enter capture mode publishes a mode-switch failure.
    pub async fn select_mode(&mut self, mode: Mode) -> Result<()> {
        match mode {
            Mode::SingleImage => self.controller.lock().await.switch_mode(mode).await,
            Mode::Capture => {
                let result = {
                    let mut controller = self.controller.lock().await;
                    match controller.switch_mode(mode).await {
                        Ok(()) => Ok(controller.capture_epoch()),
                        Err(e) => {
                            controller.publish(StatusMessage::ModeSwitchFailed);
                            Err(e)
                        }
                    }
                };
                self.ensure_loop(result?);
                Ok(())
            }
        }
    }

    /// The camera button
    ///
    /// - `Toggle`: in single-image mode switches back to capture; otherwise
    ///   stops a running capture or starts a stopped one.
    /// - `Exclusive`: only acts in capture mode; mode changes go through
    ///   [`Session::select_mode`].
    pub async fn toggle_capture(&mut self) -> Result<()> {
        let (mode, capturing) = {
            let controller = self.controller.lock().await;
            (controller.mode(), controller.is_capturing())
        };

        match (self.strategy, mode) {
            (ModeStrategy::Toggle, Mode::SingleImage) => self.select_mode(Mode::Capture).await,
            (ModeStrategy::Exclusive, Mode::SingleImage) => {
                debug!("Camera toggle ignored in single-image mode");
                Ok(())
            }
            (_, Mode::Capture) if capturing => {
                self.stop_capture().await;
                Ok(())
            }
            (_, Mode::Capture) => self.start_capture().await,
        }
    }

    /// Decode an uploaded image and run one fusion cycle on it
    ///
    /// Capture is stopped before decoding starts. Decode failures are
    /// published and returned.
    pub async fn submit_upload(&mut self, bytes: Vec<u8>) -> Result<ArbitratedOutcome> {
        self.select_mode(Mode::SingleImage).await?;

        match self.decoder.decode(bytes).await {
            Ok(frame) => self.controller.lock().await.submit_single_image(frame).await,
            Err(e) => {
                warn!("Upload rejected: {}", e);
                self.controller.lock().await.publish(e.status_message());
                Err(e)
            }
        }
    }

    /// Stop capture, release the device and wait for the loop to end
    pub async fn shutdown(mut self) -> Option<LoopSummary> {
        self.controller.lock().await.release_device();

        let (_, handle) = self.capture_loop.take()?;
        match handle.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Capture loop task failed: {}", e);
                None
            }
        }
    }

    fn ensure_loop(&mut self, epoch: u64) {
        if let Some((running_epoch, handle)) = &self.capture_loop {
            if *running_epoch == epoch && !handle.is_finished() {
                return;
            }
        }

        info!(epoch, "Spawning capture loop");
        let handle = spawn_capture_loop(self.controller(), self.tick_interval, epoch);
        // A superseded loop exits on its own at its next tick
        self.capture_loop = Some((epoch, handle));
    }
}
