//! Belief state and its audit trail.

use serde::{Deserialize, Serialize};

use crate::domain::labeled::Distribution;

/// An auxiliary observation expressed as per-intent likelihood multipliers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LikelihoodSignal {
    pub name: String,
    pub likelihoods: Distribution,
}

impl LikelihoodSignal {
    pub fn new(name: impl Into<String>, likelihoods: Distribution) -> Self {
        Self {
            name: name.into(),
            likelihoods,
        }
    }
}

/// One Bayesian update, captured before the next one runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeliefStep {
    pub signal: String,
    pub prior: Distribution,
    pub likelihood: Distribution,
    pub posterior: Distribution,
}

/// Final beliefs plus the replayable update history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeliefState {
    pub final_beliefs: Distribution,
    pub update_history: Vec<BeliefStep>,
}

impl BeliefState {
    /// Authoritative posterior: the last step's posterior, or the prior when
    /// no signal was applied.
    pub fn posterior(&self) -> &Distribution {
        self.update_history
            .last()
            .map(|step| &step.posterior)
            .unwrap_or(&self.final_beliefs)
    }

    /// Arg-max intent of the posterior (first label wins ties).
    pub fn top_intent(&self) -> Option<&str> {
        self.posterior().argmax().map(|(label, _)| label)
    }
}
