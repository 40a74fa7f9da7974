//! Ensemble - the loaded range classifiers in fixed model order
//!
//! Loading is all-or-nothing: the ensemble only exists once every configured
//! model has loaded. A frame is scored by every model concurrently, and the
//! cycle only reaches fusion when every model produced a result.

use crate::classifier::{ClassifierLoader, ImageClassifier};
use crate::error::Result;
use crate::fusion::{self, classify_verdict, ArbitratedOutcome, ModelVerdict};
use crate::sink::DisplaySink;
use crate::status::StatusMessage;
use crate::types::{Frame, ModelIdentity};
use digit_common::EnsembleConfig;
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// One loaded classifier with its identity
pub struct ModelSlot {
    pub identity: ModelIdentity,
    pub classifier: Box<dyn ImageClassifier>,
}

impl ModelSlot {
    pub fn new(identity: ModelIdentity, classifier: Box<dyn ImageClassifier>) -> Self {
        Self {
            identity,
            classifier,
        }
    }
}

/// All range classifiers, in the order that breaks fusion ties
pub struct Ensemble {
    slots: Vec<ModelSlot>,
}

impl Ensemble {
    /// Build an ensemble from already loaded slots (order is preserved)
    pub fn new(slots: Vec<ModelSlot>) -> Result<Self> {
        if slots.is_empty() {
            return Err(digit_common::Error::InvalidInput(
                "An ensemble needs at least one model".to_string(),
            )
            .into());
        }

        let mut seen = HashSet::new();
        for slot in &slots {
            if !seen.insert(slot.identity.key.as_str()) {
                return Err(digit_common::Error::InvalidInput(format!(
                    "Duplicate model key '{}'",
                    slot.identity.key
                ))
                .into());
            }
        }

        Ok(Self { slots })
    }

    /// Load every configured model in sorted key order
    ///
    /// Publishes the loading status first. On the first failure the
    /// failure status is published and the error returned; no partial
    /// ensemble is ever built.
    pub async fn load(
        config: &EnsembleConfig,
        loader: &dyn ClassifierLoader,
        sink: &dyn DisplaySink,
    ) -> Result<Self> {
        sink.publish(&StatusMessage::LoadingModels.to_string());

        let mut slots = Vec::with_capacity(config.models.len());
        for (key, model_config) in &config.models {
            let identity = ModelIdentity::from_config(key, model_config);
            let classifier = match loader.load(key, model_config).await {
                Ok(classifier) => classifier,
                Err(e) => {
                    error!(model = %key, "Model load failed: {}", e);
                    sink.publish(&StatusMessage::ModelLoadFailed.to_string());
                    return Err(e);
                }
            };

            if !classifier
                .labels()
                .iter()
                .any(|label| identity.is_rejection(label))
            {
                warn!(
                    model = %key,
                    rejection_label = %identity.rejection_label,
                    "Rejection label not among the model's labels; it can never reject"
                );
            }

            slots.push(ModelSlot::new(identity, classifier));
        }

        let ensemble = Self::new(slots)?;
        info!(models = ensemble.len(), "All models loaded");
        Ok(ensemble)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Model identities in fixed order
    pub fn identities(&self) -> impl Iterator<Item = &ModelIdentity> {
        self.slots.iter().map(|slot| &slot.identity)
    }

    /// Score `frame` with every model and reduce each result to a verdict
    ///
    /// Models run concurrently; verdicts come back in fixed model order.
    /// Fails with the first (in model order) error if any model fails.
    pub async fn classify(&self, frame: &Frame) -> Result<Vec<ModelVerdict>> {
        let results = join_all(self.slots.iter().map(|slot| slot.classifier.predict(frame))).await;

        let mut verdicts = Vec::with_capacity(results.len());
        for (slot, result) in self.slots.iter().zip(results) {
            let predictions = result?;
            let verdict = classify_verdict(&predictions);
            debug!(
                model = %slot.identity.key,
                label = %verdict.label,
                probability = verdict.probability,
                "Model verdict"
            );
            verdicts.push(ModelVerdict::new(slot.identity.clone(), verdict));
        }
        Ok(verdicts)
    }

    /// Run one full fusion cycle on `frame`
    pub async fn evaluate(&self, frame: &Frame) -> Result<ArbitratedOutcome> {
        let verdicts = self.classify(frame).await?;
        Ok(fusion::fuse(&verdicts))
    }

    /// Look up a model by key
    pub fn identity(&self, key: &str) -> Option<&ModelIdentity> {
        self.identities().find(|id| id.key == key)
    }
}

impl std::fmt::Debug for Ensemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ensemble")
            .field("models", &self.identities().collect::<Vec<_>>())
            .finish()
    }
}
