//! Intent classification.
//!
//! Decision order, each branch terminal:
//! 1. explicit `intent` override → confidence 1.0
//! 2. empty query → referrer heuristic
//! 3. remote embedding + cosine similarity + softmax, under a hard timeout
//! 4. any remote failure → keyword rules, with the failure reason attached
//!
//! `classify` never returns an error; every failure resolves to a
//! lower-confidence result.

pub mod math;
pub mod rules;

use std::sync::Arc;
use std::time::{Duration, Instant};

use personalize_remote::EmbeddingProvider;

use crate::assets::IntentVectors;
use crate::config::ClassifierConfig;
use crate::domain::classification::{ClassificationMethod, ClassificationResult};
use crate::domain::context::ContextSnapshot;
use crate::domain::labeled::Distribution;
use crate::metrics::METRICS;
use crate::obs;
use crate::race::first_or_timeout;

use self::math::{cosine_similarity, round_to, softmax};
use self::rules::{match_keywords, match_referrer, RuleVerdict};

/// Outcome of a successful remote classification, before timing is attached.
struct SemanticVerdict {
    intent: String,
    confidence: f64,
    probabilities: Distribution,
    similarities: Distribution,
}

/// Turns a context snapshot into a [`ClassificationResult`].
pub struct IntentClassifier {
    provider: Arc<dyn EmbeddingProvider>,
    vectors: Arc<IntentVectors>,
    catalog: Vec<String>,
    config: ClassifierConfig,
}

impl IntentClassifier {
    /// `catalog` is the full set of known intents that local-rule
    /// distributions are spread over.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        vectors: Arc<IntentVectors>,
        catalog: Vec<String>,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            provider,
            vectors,
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    pub async fn classify(&self, snapshot: &ContextSnapshot) -> ClassificationResult {
        let started = Instant::now();

        if let Some(forced) = snapshot
            .intent_override
            .as_deref()
            .map(|i| i.trim().to_uppercase())
            .filter(|i| !i.is_empty())
        {
            let verdict = RuleVerdict {
                rationale: format!("explicit intent override {forced}"),
                intent: forced,
                confidence: 1.0,
            };
            return self.local_result(verdict, ClassificationMethod::ExplicitOverride, None, started);
        }

        let query = snapshot.query.trim().to_lowercase();
        if query.is_empty() {
            let verdict = match_referrer(snapshot.referrer_kind, &self.config);
            return self.local_result(verdict, ClassificationMethod::ReferrerHeuristic, None, started);
        }

        match self.classify_remote(&query).await {
            Ok(semantic) => ClassificationResult {
                rationale: format!(
                    "semantic match to {} via {} embedding",
                    semantic.intent,
                    self.provider.name()
                ),
                intent: semantic.intent,
                confidence: round_to(semantic.confidence, self.config.report_precision),
                method: ClassificationMethod::RemoteEmbedding,
                probabilities: semantic.probabilities,
                similarities: Some(semantic.similarities),
                elapsed_ms: elapsed_ms(started),
                fallback_reason: None,
            },
            Err(reason) => {
                obs::emit_classification_degraded(&reason);
                METRICS.inc_classifications_degraded();
                let verdict = match_keywords(&query, &self.config);
                self.local_result(
                    verdict,
                    ClassificationMethod::RuleBasedFallback,
                    Some(reason),
                    started,
                )
            }
        }
    }

    async fn classify_remote(&self, query: &str) -> Result<SemanticVerdict, String> {
        if self.vectors.is_empty() {
            return Err("no intent reference vectors loaded".to_string());
        }

        let provider = self.provider.clone();
        let text = query.to_string();
        let budget = Duration::from_millis(self.config.embedding_timeout_ms);
        let embedding = first_or_timeout(budget, async move { provider.embed(&text).await })
            .await
            .map_err(|lost| format!("embedding request {lost}"))?
            .map_err(|err| err.to_string())?;

        let mut labels = Vec::with_capacity(self.vectors.len());
        let mut scores = Vec::with_capacity(self.vectors.len());
        for (label, reference) in self.vectors.iter() {
            let sim = cosine_similarity(&embedding, reference).ok_or_else(|| {
                format!(
                    "malformed embedding: cannot compare {}-dim query with {}-dim {label} vector",
                    embedding.len(),
                    reference.len()
                )
            })?;
            labels.push(label);
            scores.push(sim);
        }

        let probabilities: Distribution = labels
            .iter()
            .copied()
            .zip(softmax(&scores))
            .collect();
        let (intent, confidence) = probabilities
            .argmax()
            .map(|(label, p)| (label.to_string(), p))
            .ok_or_else(|| "empty similarity vector".to_string())?;
        let similarities: Distribution = labels
            .iter()
            .copied()
            .zip(scores.iter().map(|s| round_to(*s, self.config.report_precision)))
            .collect();

        Ok(SemanticVerdict {
            intent,
            confidence,
            probabilities,
            similarities,
        })
    }

    fn local_result(
        &self,
        verdict: RuleVerdict,
        method: ClassificationMethod,
        fallback_reason: Option<String>,
        started: Instant,
    ) -> ClassificationResult {
        let probabilities = Distribution::concentrated(
            self.catalog.iter().map(String::as_str),
            &verdict.intent,
            verdict.confidence,
        );
        ClassificationResult {
            confidence: round_to(verdict.confidence, self.config.report_precision),
            intent: verdict.intent,
            method,
            rationale: verdict.rationale,
            probabilities,
            similarities: None,
            elapsed_ms: elapsed_ms(started),
            fallback_reason,
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    round_to(started.elapsed().as_secs_f64() * 1000.0, 2)
}
