//! The decision record: one complete, immutable audit artifact per run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::belief::BeliefState;
use crate::domain::classification::ClassificationResult;
use crate::domain::context::ContextSnapshot;
use crate::domain::error::Result;
use crate::domain::render::RenderOutcome;
use crate::domain::selection::SelectionResult;
use crate::domain::template::TemplateRecord;

/// Wall-clock duration of each pipeline stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct StageTimings {
    pub context: f64,
    pub semantic: f64,
    pub bayesian: f64,
    pub thompson: f64,
    pub render: f64,
}

impl StageTimings {
    pub fn total(&self) -> f64 {
        self.context + self.semantic + self.bayesian + self.thompson + self.render
    }

    /// `(stage name, ms)` pairs in pipeline order.
    pub fn stages(&self) -> [(&'static str, f64); 5] {
        [
            ("context", self.context),
            ("semantic", self.semantic),
            ("bayesian", self.bayesian),
            ("thompson", self.thompson),
            ("render", self.render),
        ]
    }
}

/// Everything one run decided and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionRecord {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub context: ContextSnapshot,
    pub semantic: ClassificationResult,
    pub bayesian: BeliefState,

    /// None when no template is registered for the top intent.
    pub thompson: Option<SelectionResult>,

    /// Template handed to the renderer.
    pub selected_template: TemplateRecord,

    pub render: RenderOutcome,
    pub timings: StageTimings,
    pub total_time_ms: f64,

    /// Whether personalized content reached the page.
    pub applied: bool,

    /// Hex SHA-256 of the rest of the record, set once the run has finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl DecisionRecord {
    /// Intent that drove selection and rendering.
    pub fn top_intent(&self) -> Option<&str> {
        self.bayesian.top_intent()
    }

    /// SHA-256 of the record's canonical JSON encoding, excluding `digest`.
    pub fn compute_digest(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Some(fields) = value.as_object_mut() {
            fields.remove("digest");
        }
        let bytes = serde_json::to_vec(&value)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Compute and store the digest.
    pub fn seal(&mut self) -> Result<&str> {
        let digest = self.compute_digest()?;
        Ok(self.digest.insert(digest).as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timings_total_and_order() {
        let timings = StageTimings {
            context: 0.1,
            semantic: 120.0,
            bayesian: 0.2,
            thompson: 0.05,
            render: 210.0,
        };
        assert!((timings.total() - 330.35).abs() < 1e-9);
        let names: Vec<_> = timings.stages().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["context", "semantic", "bayesian", "thompson", "render"]);
    }
}
