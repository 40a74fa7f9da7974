//! Cooperative capture loop
//!
//! The host offers the loop a tick at a fixed cadence (`tick_interval`);
//! the [`Throttle`] decides whether that tick does any work. Each tick takes
//! the controller lock once, so fusion cycles never overlap and `stop()`
//! waits for an in-flight tick to publish before the loop halts.

use crate::controller::{SamplingController, TickOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Controller shared between the loop task and the mode-selection surface
pub type SharedController = Arc<Mutex<SamplingController>>;

/// Minimum spacing between two units of work
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last_run: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_run: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Whether work may run at `now`
    pub fn is_ready_at(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        }
    }

    /// Record that work ran at `now`
    pub fn mark_at(&mut self, now: Instant) {
        self.last_run = Some(now);
    }

    /// Claim the slot at `now` if it is free
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        if self.is_ready_at(now) {
            self.mark_at(now);
            true
        } else {
            false
        }
    }

    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Forget the last run so the next tick is admitted immediately
    pub fn reset(&mut self) {
        self.last_run = None;
    }
}

/// Counters reported when a capture loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks: u64,
    pub published: u64,
    pub throttled: u64,
    pub failed: u64,
}

/// Spawn the capture loop for capture epoch `epoch`
///
/// The loop ends on the first tick that finds capture inactive or a newer
/// epoch started. It yields to the runtime after every tick.
pub fn spawn_capture_loop(
    controller: SharedController,
    tick_interval: Duration,
    epoch: u64,
) -> JoinHandle<LoopSummary> {
    tokio::spawn(async move {
        info!(epoch, "Capture loop started (tick: {:?})", tick_interval);

        let mut timer = interval(tick_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut summary = LoopSummary::default();

        loop {
            timer.tick().await;

            let outcome = {
                let mut controller = controller.lock().await;
                if controller.capture_epoch() != epoch {
                    debug!(epoch, "Capture loop superseded");
                    break;
                }
                controller.tick().await
            };

            match outcome {
                TickOutcome::Halted => break,
                TickOutcome::Throttled => summary.throttled += 1,
                TickOutcome::Published(_) => summary.published += 1,
                TickOutcome::Failed => summary.failed += 1,
            }
            summary.ticks += 1;

            tokio::task::yield_now().await;
        }

        info!(
            epoch,
            ticks = summary.ticks,
            published = summary.published,
            failed = summary.failed,
            "Capture loop ended"
        );
        summary
    })
}
