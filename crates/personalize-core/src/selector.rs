//! Template selection from Beta-posterior conversion estimates.
//!
//! Counters live in a [`TemplateStatsStore`]; the selector only reads them.
//! Recording observed conversions is the caller's job.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rand::distributions::Distribution as _;
use statrs::distribution::Beta;

use crate::domain::selection::{SelectionResult, SelectionStrategy};
use crate::domain::template::{PerformanceCounters, TemplateRegistry};

/// z-score for a two-sided 95% normal interval.
const Z_95: f64 = 1.96;

/// Per-template success/failure counters.
#[async_trait]
pub trait TemplateStatsStore: Send + Sync {
    /// Counters for a template, or None when the store has never seen it.
    async fn counters(&self, template_id: &str) -> Option<PerformanceCounters>;

    async fn record_success(&self, template_id: &str);

    async fn record_failure(&self, template_id: &str);
}

/// In-process counter store, seeded from the registry.
#[derive(Debug, Default)]
pub struct MemoryTemplateStats {
    counters: RwLock<HashMap<String, PerformanceCounters>>,
}

impl MemoryTemplateStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with every template's registry counters (unset counters start at 1).
    pub fn from_registry(registry: &TemplateRegistry) -> Self {
        let counters = registry
            .templates
            .values()
            .map(|t| (t.template_id.clone(), t.counters()))
            .collect();
        Self {
            counters: RwLock::new(counters),
        }
    }

    fn update(&self, template_id: &str, apply: impl FnOnce(&mut PerformanceCounters)) {
        let mut counters = self.counters.write().unwrap_or_else(|e| e.into_inner());
        apply(counters.entry(template_id.to_string()).or_default());
    }
}

#[async_trait]
impl TemplateStatsStore for MemoryTemplateStats {
    async fn counters(&self, template_id: &str) -> Option<PerformanceCounters> {
        let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
        counters.get(template_id).copied()
    }

    async fn record_success(&self, template_id: &str) {
        self.update(template_id, |c| c.successes += 1);
    }

    async fn record_failure(&self, template_id: &str) {
        self.update(template_id, |c| c.failures += 1);
    }
}

/// Closed-form Beta(s, f) summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaSummary {
    pub mean: f64,
    pub variance: f64,
    pub interval: (f64, f64),
}

/// Mean, variance and clamped 95% interval of Beta(s, f). Counters are
/// floored at 1.
pub fn beta_summary(successes: u64, failures: u64) -> BetaSummary {
    let s = successes.max(1) as f64;
    let f = failures.max(1) as f64;
    let n = s + f;
    let mean = s / n;
    let variance = (s * f) / (n * n * (n + 1.0));
    let half_width = Z_95 * variance.sqrt();
    BetaSummary {
        mean,
        variance,
        interval: (
            (mean - half_width).clamp(0.0, 1.0),
            (mean + half_width).clamp(0.0, 1.0),
        ),
    }
}

/// Picks the template for an intent and reports its conversion estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSelector {
    strategy: SelectionStrategy,
}

impl TemplateSelector {
    pub fn new(strategy: SelectionStrategy) -> Self {
        Self { strategy }
    }

    /// None when no template is registered for `intent`.
    pub async fn select(
        &self,
        intent: &str,
        registry: &TemplateRegistry,
        stats: &dyn TemplateStatsStore,
    ) -> Option<SelectionResult> {
        let template = registry.template_for(intent)?;
        let counters = stats
            .counters(&template.template_id)
            .await
            .unwrap_or_else(|| template.counters());
        let successes = counters.successes.max(1);
        let failures = counters.failures.max(1);
        let summary = beta_summary(successes, failures);

        let sampled_cvr = match self.strategy {
            SelectionStrategy::PointEstimate => None,
            SelectionStrategy::ThompsonDraw => draw(successes, failures),
        };

        tracing::debug!(
            intent = %intent,
            template_id = %template.template_id,
            estimated_cvr = summary.mean,
            "template selected"
        );

        Some(SelectionResult {
            chosen_template: template.template_id.clone(),
            intent: intent.to_string(),
            strategy: self.strategy,
            successes,
            failures,
            estimated_cvr: summary.mean,
            confidence_interval: summary.interval,
            sampled_cvr,
        })
    }
}

/// One sample from Beta(s, f).
fn draw(successes: u64, failures: u64) -> Option<f64> {
    match Beta::new(successes as f64, failures as f64) {
        Ok(dist) => Some(dist.sample(&mut rand::thread_rng())),
        Err(err) => {
            tracing::warn!(error = %err, "invalid beta parameters; skipping draw");
            None
        }
    }
}
