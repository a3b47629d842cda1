//! Template selection results.

use serde::{Deserialize, Serialize};

/// How the selector ranks a template.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Closed-form Beta mean; deterministic, exploitation only.
    #[default]
    PointEstimate,
    /// One random draw from the Beta posterior per selection.
    ThompsonDraw,
}

/// Derived, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionResult {
    pub chosen_template: String,
    pub intent: String,
    pub strategy: SelectionStrategy,

    /// Counters after flooring at 1.
    pub successes: u64,
    pub failures: u64,

    /// Beta posterior mean `s / (s + f)`.
    pub estimated_cvr: f64,

    /// Two-sided 95% normal-approximation interval, clamped to [0, 1].
    pub confidence_interval: (f64, f64),

    /// Posterior draw (ThompsonDraw only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampled_cvr: Option<f64>,
}
