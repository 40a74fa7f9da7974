//! Display sink that records every line

use digit_ensemble::DisplaySink;
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.lines.lock().unwrap().last().cloned()
    }

    pub fn count(&self, text: &str) -> usize {
        self.lines.lock().unwrap().iter().filter(|l| *l == text).count()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.count(text) > 0
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }
}

impl DisplaySink for RecordingSink {
    fn publish(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}
