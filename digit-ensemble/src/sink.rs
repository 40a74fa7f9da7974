//! Display sinks
//!
//! The display is write-only from the core's point of view: the controller
//! publishes status lines and never reads anything back. Last write wins.

use digit_common::{DisplayEvent, EventBus};
use std::io::Write;
use tracing::trace;

/// Fire-and-forget status output
pub trait DisplaySink: Send + Sync {
    fn publish(&self, text: &str);
}

/// Prints each status line to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl DisplaySink for ConsoleSink {
    fn publish(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not take the session down
        let _ = writeln!(stdout, "{}", text);
    }
}

/// Emits each status line as a [`DisplayEvent::Status`] on an event bus
#[derive(Clone)]
pub struct BroadcastSink {
    bus: EventBus,
}

impl BroadcastSink {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

impl DisplaySink for BroadcastSink {
    fn publish(&self, text: &str) {
        if self.bus.emit(DisplayEvent::status(text)).is_err() {
            trace!("No display subscribers for status: {}", text);
        }
    }
}
