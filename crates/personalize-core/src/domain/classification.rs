//! Intent classification results.

use serde::{Deserialize, Serialize};

use crate::domain::labeled::Distribution;

/// Well-known intent labels.
pub mod intents {
    pub const GAMING: &str = "GAMING";
    pub const PROFESSIONAL: &str = "PROFESSIONAL";
    pub const BUDGET: &str = "BUDGET";
    pub const DEFAULT: &str = "DEFAULT";
}

/// How an intent was inferred.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    ExplicitOverride,
    RemoteEmbedding,
    ReferrerHeuristic,
    RuleBasedFallback,
}

impl ClassificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationMethod::ExplicitOverride => "explicit_override",
            ClassificationMethod::RemoteEmbedding => "remote_embedding",
            ClassificationMethod::ReferrerHeuristic => "referrer_heuristic",
            ClassificationMethod::RuleBasedFallback => "rule_based_fallback",
        }
    }
}

/// Outcome of classifying one context snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub intent: String,

    /// Confidence in [0, 1], rounded for reporting.
    pub confidence: f64,

    pub method: ClassificationMethod,

    /// Human-readable explanation.
    pub rationale: String,

    /// Full distribution over known intents (unrounded, sums to 1).
    pub probabilities: Distribution,

    /// Cosine similarity per intent, rounded for reporting (remote path only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarities: Option<Distribution>,

    pub elapsed_ms: f64,

    /// Why the remote path was abandoned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}
