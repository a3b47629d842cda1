//! Sequential Bayesian belief fusion.

use crate::domain::belief::{BeliefState, BeliefStep, LikelihoodSignal};
use crate::domain::labeled::Distribution;

/// Folds likelihood signals into a prior distribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeliefFusionEngine;

impl BeliefFusionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Apply `signals` to `prior` in order.
    ///
    /// Each step multiplies every intent's belief by the signal's likelihood
    /// for it (1.0 when absent) and renormalises. A zero total is treated as
    /// 1, which leaves that step's beliefs unnormalised.
    pub fn fuse(&self, prior: &Distribution, signals: &[LikelihoodSignal]) -> BeliefState {
        let mut beliefs = prior.clone();
        let mut update_history = Vec::with_capacity(signals.len());

        for signal in signals {
            let step_prior = beliefs.clone();

            let likelihood: Distribution = step_prior
                .labels()
                .map(|label| (label, signal.likelihoods.get(label).copied().unwrap_or(1.0)))
                .collect();

            let unnormalised: Distribution = step_prior
                .iter()
                .zip(likelihood.values())
                .map(|((label, p), l)| (label, p * l))
                .collect();

            let total = match unnormalised.total() {
                t if t == 0.0 => 1.0,
                t => t,
            };
            let posterior: Distribution = unnormalised
                .iter()
                .map(|(label, p)| (label, p / total))
                .collect();

            tracing::debug!(
                signal = %signal.name,
                top = ?posterior.argmax().map(|(label, _)| label),
                "belief updated"
            );

            update_history.push(BeliefStep {
                signal: signal.name.clone(),
                prior: step_prior,
                likelihood,
                posterior: posterior.clone(),
            });
            beliefs = posterior;
        }

        BeliefState {
            final_beliefs: beliefs,
            update_history,
        }
    }
}
