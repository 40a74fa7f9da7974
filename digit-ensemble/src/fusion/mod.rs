// Ensemble Fusion Engine
//
// Pure decision logic: one verdict per range classifier in, one arbitrated
// outcome out. No I/O, no timing.
//
// Pipeline: ClassifierResult → classify_verdict → PerModelVerdict → fuse → ArbitratedOutcome

pub mod arbitration;
pub mod verdict;

pub use arbitration::fuse;
pub use verdict::classify_verdict;

use crate::types::{ModelIdentity, Probability};
use serde::Serialize;

/// Top-probability (label, probability) pair of one classifier for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerModelVerdict {
    pub label: String,
    pub probability: Probability,
}

impl PerModelVerdict {
    pub fn new(label: impl Into<String>, probability: Probability) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// A verdict tagged with the model that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelVerdict {
    pub identity: ModelIdentity,
    pub verdict: PerModelVerdict,
}

impl ModelVerdict {
    pub fn new(identity: ModelIdentity, verdict: PerModelVerdict) -> Self {
        Self { identity, verdict }
    }

    /// The model voted "none of my digits"
    pub fn is_rejecting(&self) -> bool {
        self.identity.is_rejection(&self.verdict.label)
    }
}

/// A non-rejecting verdict chosen by arbitration, with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub model: ModelIdentity,
    pub label: String,
    pub probability: Probability,
}

impl From<&ModelVerdict> for Detection {
    fn from(v: &ModelVerdict) -> Self {
        Self {
            model: v.identity.clone(),
            label: v.verdict.label.clone(),
            probability: v.verdict.probability,
        }
    }
}

/// Fusion result for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detection")]
pub enum ArbitratedOutcome {
    /// Every model rejected the frame
    NoDetection,
    /// Exactly one model claimed the frame (no confidence floor)
    SingleMatch(Detection),
    /// Several models claimed the frame; the most confident won
    BestOfMultiple(Detection),
}

impl ArbitratedOutcome {
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            ArbitratedOutcome::NoDetection => None,
            ArbitratedOutcome::SingleMatch(d) | ArbitratedOutcome::BestOfMultiple(d) => Some(d),
        }
    }

    pub fn is_detection(&self) -> bool {
        self.detection().is_some()
    }
}

impl std::fmt::Display for ArbitratedOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArbitratedOutcome::NoDetection => write!(f, "NoDetection"),
            ArbitratedOutcome::SingleMatch(d) => write!(
                f,
                "SingleMatch({}, {:?}, {:.3})",
                d.model.key, d.label, d.probability
            ),
            ArbitratedOutcome::BestOfMultiple(d) => write!(
                f,
                "BestOfMultiple({}, {:?}, {:.3})",
                d.model.key, d.label, d.probability
            ),
        }
    }
}
