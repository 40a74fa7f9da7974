//! Sampling Loop Controller
//!
//! Owns the capture device, the loaded ensemble and the lifecycle state:
//!
//! ```text
//! Idle ──start()──► CaptureActive ◄──start()── Stopped
//!                        │                        ▲
//!                        └────────stop()──────────┘
//! ```
//!
//! `SingleShotPending` is orthogonal: a single-image submission enters it
//! for exactly one fusion cycle and then returns to the previous state.
//! Capture and single-shot never run concurrently; a submission first stops
//! capture.
//!
//! Every failure is converted to a status line on the display sink at the
//! boundary of the operation that failed.

use crate::capture::{CaptureConnector, CaptureDevice};
use crate::ensemble::Ensemble;
use crate::error::{Error, Result};
use crate::fusion::ArbitratedOutcome;
use crate::scheduler::Throttle;
use crate::sink::DisplaySink;
use crate::status::StatusMessage;
use crate::types::Frame;
use digit_common::{CaptureSettings, DisplayEvent, EngineState, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Selected input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Continuous sampling from the capture device
    Capture,
    /// One fusion cycle per uploaded image
    SingleImage,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Capture => write!(f, "capture"),
            Mode::SingleImage => write!(f, "single-image"),
        }
    }
}

/// Result of one scheduling tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Capture is not active; the loop must end
    Halted,
    /// Throttle interval not yet elapsed; no work done
    Throttled,
    /// A fusion cycle ran and its outcome was published
    Published(ArbitratedOutcome),
    /// The cycle failed; the failure was published and the loop continues
    Failed,
}

pub struct SamplingController {
    ensemble: Ensemble,
    connector: Arc<dyn CaptureConnector>,
    capture_settings: CaptureSettings,
    device: Option<Box<dyn CaptureDevice>>,
    state: EngineState,
    mode: Mode,
    throttle: Throttle,
    sink: Arc<dyn DisplaySink>,
    event_bus: Option<EventBus>,
    /// Incremented on every successful start()
    capture_epoch: u64,
}

impl SamplingController {
    pub fn new(
        ensemble: Ensemble,
        connector: Arc<dyn CaptureConnector>,
        capture_settings: CaptureSettings,
        throttle_interval: Duration,
        sink: Arc<dyn DisplaySink>,
    ) -> Self {
        Self {
            ensemble,
            connector,
            capture_settings,
            device: None,
            state: EngineState::Idle,
            mode: Mode::Capture,
            throttle: Throttle::new(throttle_interval),
            sink,
            event_bus: None,
            capture_epoch: 0,
        }
    }

    /// Also broadcast lifecycle transitions on `bus`
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_capturing(&self) -> bool {
        self.state == EngineState::CaptureActive
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn capture_epoch(&self) -> u64 {
        self.capture_epoch
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Enter capture mode and begin sampling
    ///
    /// The device is acquired on first use and kept across stop/start
    /// cycles. Calling start() while already capturing is a no-op.
    ///
    /// # Errors
    /// `Error::DeviceUnavailable` if the device cannot be acquired or
    /// started; the state is left `Stopped` and the failure is published.
    pub async fn start(&mut self) -> Result<()> {
        if self.is_capturing() {
            debug!("start() ignored: capture already active");
            return Ok(());
        }

        self.publish(StatusMessage::StartingCapture);

        if let Err(e) = self.play_device().await {
            warn!("Capture start failed: {}", e);
            self.set_state(EngineState::Stopped);
            self.publish(e.status_message());
            return Err(e);
        }

        self.mode = Mode::Capture;
        self.capture_epoch += 1;
        self.throttle.reset();
        self.set_state(EngineState::CaptureActive);
        info!(epoch = self.capture_epoch, "Capture started");
        Ok(())
    }

    async fn play_device(&mut self) -> Result<()> {
        if self.device.is_none() {
            let device = self.connector.setup(&self.capture_settings).await?;
            info!(
                "Capture device acquired ({}x{}, flip: {})",
                self.capture_settings.width,
                self.capture_settings.height,
                self.capture_settings.flip
            );
            self.device = Some(device);
        }

        match self.device.as_mut() {
            Some(device) => device.play().await,
            None => Err(Error::DeviceUnavailable("no capture device".to_string())),
        }
    }

    /// Stop sampling; the device stays acquired
    ///
    /// Idempotent: a no-op unless capture is active.
    pub fn stop(&mut self) {
        if !self.is_capturing() {
            debug!("stop() ignored: state is {}", self.state);
            return;
        }

        if let Some(device) = self.device.as_mut() {
            device.stop();
        }
        self.set_state(EngineState::Stopped);
        self.publish(StatusMessage::CaptureStopped);
        info!("Capture stopped");
    }

    /// Stop capture and drop the device; the next start() acquires a new one
    pub fn release_device(&mut self) {
        self.stop();
        if let Some(mut device) = self.device.take() {
            device.stop();
            info!("Capture device released");
        }
        if self.state == EngineState::Stopped {
            self.set_state(EngineState::Idle);
        }
    }

    /// Select the input mode
    ///
    /// Selecting single-image stops capture; selecting capture starts it.
    pub async fn switch_mode(&mut self, mode: Mode) -> Result<()> {
        info!("Switching to {} mode", mode);
        match mode {
            Mode::SingleImage => {
                self.stop();
                self.mode = Mode::SingleImage;
                Ok(())
            }
            Mode::Capture => {
                self.mode = Mode::Capture;
                self.start().await
            }
        }
    }

    /// One scheduling tick: frame → classify → fuse → publish
    ///
    /// Failures are published and reported as [`TickOutcome::Failed`]; they
    /// never end capture.
    pub async fn tick(&mut self) -> TickOutcome {
        if !self.is_capturing() {
            return TickOutcome::Halted;
        }
        if !self.throttle.try_acquire() {
            return TickOutcome::Throttled;
        }

        let frame = match self.device.as_mut() {
            Some(device) => device.current_frame().await,
            None => Err(Error::DeviceUnavailable("no capture device".to_string())),
        };

        let result = match frame {
            Ok(frame) => self.ensemble.evaluate(&frame).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                debug!("Tick outcome: {}", outcome);
                self.publish(StatusMessage::from(&outcome));
                TickOutcome::Published(outcome)
            }
            Err(e) => {
                warn!("Capture tick failed: {}", e);
                self.publish(StatusMessage::PredictionFailed);
                TickOutcome::Failed
            }
        }
    }

    /// Run exactly one fusion cycle on an uploaded frame
    ///
    /// Stops capture first if it is running. Not throttled.
    ///
    /// # Errors
    /// `Error::Inference` if any model fails; the failure is also published.
    pub async fn submit_single_image(&mut self, frame: Frame) -> Result<ArbitratedOutcome> {
        self.stop();
        self.mode = Mode::SingleImage;

        let previous = self.state;
        self.set_state(EngineState::SingleShotPending);
        self.publish(StatusMessage::AnalyzingImage);

        let result = self.ensemble.evaluate(&frame).await;
        self.set_state(previous);

        match &result {
            Ok(outcome) => {
                info!("Single image outcome: {}", outcome);
                self.publish(StatusMessage::from(outcome));
            }
            Err(e) => {
                warn!("Single image prediction failed: {}", e);
                self.publish(e.status_message());
            }
        }
        result
    }

    /// Publish a status line to the display sink
    pub fn publish(&self, message: StatusMessage) {
        self.sink.publish(&message.to_string());
    }

    fn set_state(&mut self, new_state: EngineState) {
        let old_state = self.state;
        if old_state == new_state {
            return;
        }
        self.state = new_state;
        debug!("Engine state: {} -> {}", old_state, new_state);

        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(DisplayEvent::state_changed(old_state, new_state));
        }
    }
}

impl std::fmt::Debug for SamplingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingController")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("has_device", &self.device.is_some())
            .field("capture_epoch", &self.capture_epoch)
            .finish()
    }
}
