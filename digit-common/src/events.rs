//! Display events and the broadcast event bus
//!
//! The display surface is a pure projection of the most recent status line,
//! so subscribers only ever need the latest event. Slow subscribers lag and
//! drop old events rather than applying backpressure to the capture loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Sampling loop controller lifecycle state
///
/// `SingleShotPending` is orthogonal to the capture states: it is entered
/// for exactly one fusion cycle and then left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No capture device, no loop
    Idle,
    /// Device open, loop running
    CaptureActive,
    /// Decoded upload awaiting its fusion cycle
    SingleShotPending,
    /// Device paused, loop halted
    Stopped,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Idle => write!(f, "Idle"),
            EngineState::CaptureActive => write!(f, "CaptureActive"),
            EngineState::SingleShotPending => write!(f, "SingleShotPending"),
            EngineState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Events published to display subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DisplayEvent {
    /// New status line for the display
    Status {
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// Controller lifecycle transition
    EngineStateChanged {
        old_state: EngineState,
        new_state: EngineState,
        timestamp: DateTime<Utc>,
    },
}

impl DisplayEvent {
    /// Status event stamped with the current time
    pub fn status(text: impl Into<String>) -> Self {
        DisplayEvent::Status {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// State change event stamped with the current time
    pub fn state_changed(old_state: EngineState, new_state: EngineState) -> Self {
        DisplayEvent::EngineStateChanged {
            old_state,
            new_state,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast bus for display events
///
/// Cheap to clone; every clone shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DisplayEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before lagging subscribers drop old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<DisplayEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: DisplayEvent,
    ) -> Result<usize, broadcast::error::SendError<DisplayEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DisplayEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
