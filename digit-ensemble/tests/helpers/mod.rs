//! Test helpers for digit-ensemble integration tests
//!
//! - ScriptedClassifier / ScriptedLoader: classifiers with canned answers
//! - GatedClassifier: classifier held mid-predict until the test releases it
//! - ScriptedConnector: capture device with observable setup/play counts
//! - RecordingSink: display sink that keeps every published line

#![allow(dead_code)]

pub mod capture;
pub mod classifiers;
pub mod recording_sink;

pub use capture::{DeviceCounters, ScriptedConnector};
pub use classifiers::{scenario_a_ensemble, GatedClassifier, ScriptedClassifier, ScriptedLoader};
pub use recording_sink::RecordingSink;

use std::time::Duration;

/// Poll `condition` every few milliseconds until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Encoded PNG of a blank image
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image::DynamicImage::new_rgb8(width, height)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .expect("encode test PNG");
    buffer.into_inner()
}
