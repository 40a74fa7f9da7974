//! Classifiers with canned answers

use async_trait::async_trait;
use digit_common::ModelConfig;
use digit_ensemble::classifier::{ClassifierLoader, ImageClassifier};
use digit_ensemble::{ClassifierResult, Ensemble, Error, Frame, ModelIdentity, ModelSlot, Prediction, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Classifier answering from a queue of scripted responses
///
/// Once the queue is empty every call gets the fallback answer.
pub struct ScriptedClassifier {
    key: String,
    labels: Vec<String>,
    queued: Mutex<VecDeque<std::result::Result<ClassifierResult, String>>>,
    fallback: ClassifierResult,
    calls: Arc<AtomicUsize>,
}

impl ScriptedClassifier {
    pub fn new(key: &str, answer: &[(&str, f64)]) -> Self {
        let fallback: ClassifierResult = answer.iter().map(|(l, p)| Prediction::new(*l, *p)).collect();
        Self {
            key: key.to_string(),
            labels: fallback.iter().map(|p| p.class_name.clone()).collect(),
            queued: Mutex::new(VecDeque::new()),
            fallback,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail the next call with `reason`
    pub fn then_fail(self, reason: &str) -> Self {
        self.queued.lock().unwrap().push_back(Err(reason.to_string()));
        self
    }

    /// Shared counter of predict() calls
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn into_slot(self, range: &str) -> ModelSlot {
        ModelSlot::new(ModelIdentity::new(self.key.clone(), range, "이외"), Box::new(self))
    }
}

#[async_trait]
impl ImageClassifier for ScriptedClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    async fn predict(&self, _frame: &Frame) -> Result<ClassifierResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.queued.lock().unwrap().pop_front();
        match next {
            Some(Ok(result)) => Ok(result),
            Some(Err(reason)) => Err(Error::inference(&self.key, reason)),
            None => Ok(self.fallback.clone()),
        }
    }
}

/// Classifier that holds every predict() call until released
///
/// Each call signals `entered()` and then waits on `gate()`. The answer is
/// model2's scenario A claim ("4", 0.6).
pub struct GatedClassifier {
    key: String,
    labels: Vec<String>,
    gate: Arc<Notify>,
    entered: Arc<Notify>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl GatedClassifier {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            labels: ["4", "5", "6", "이외"].iter().map(|l| l.to_string()).collect(),
            gate: Arc::new(Notify::new()),
            entered: Arc::new(Notify::new()),
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Releases one waiting predict() call
    pub fn gate(&self) -> Arc<Notify> {
        Arc::clone(&self.gate)
    }

    /// Signalled when a predict() call starts waiting
    pub fn entered(&self) -> Arc<Notify> {
        Arc::clone(&self.entered)
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Highest number of predict() calls seen running at once
    pub fn max_in_flight(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.max_in_flight)
    }

    pub fn into_slot(self, range: &str) -> ModelSlot {
        ModelSlot::new(ModelIdentity::new(self.key.clone(), range, "이외"), Box::new(self))
    }
}

#[async_trait]
impl ImageClassifier for GatedClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    async fn predict(&self, _frame: &Frame) -> Result<ClassifierResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        self.entered.notify_one();
        self.gate.notified().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![
            Prediction::new("4", 0.6),
            Prediction::new("5", 0.1),
            Prediction::new("이외", 0.3),
        ])
    }
}

/// Ensemble answering scenario A: only model2 claims the frame ("4", 0.6)
pub fn scenario_a_ensemble() -> Ensemble {
    Ensemble::new(vec![
        ScriptedClassifier::new("model1", &[("1", 0.02), ("이외", 0.9)]).into_slot("1~3"),
        ScriptedClassifier::new("model2", &[("4", 0.6), ("5", 0.1), ("이외", 0.3)]).into_slot("4~6"),
        ScriptedClassifier::new("model3", &[("7", 0.01), ("이외", 0.95)]).into_slot("7~9"),
    ])
    .expect("valid ensemble")
}

/// Loader handing out scripted classifiers, failing for chosen keys
#[derive(Default)]
pub struct ScriptedLoader {
    failing: HashMap<String, String>,
    loaded: Mutex<Vec<String>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, key: &str, reason: &str) -> Self {
        self.failing.insert(key.to_string(), reason.to_string());
        self
    }

    /// Keys loaded so far, in load order
    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClassifierLoader for ScriptedLoader {
    async fn load(&self, key: &str, config: &ModelConfig) -> Result<Box<dyn ImageClassifier>> {
        if let Some(reason) = self.failing.get(key) {
            return Err(Error::model_load(key, reason));
        }
        self.loaded.lock().unwrap().push(key.to_string());
        let answer = [("x", 0.5), (config.rejection_label.as_str(), 0.5)];
        Ok(Box::new(ScriptedClassifier::new(key, &answer)))
    }
}
