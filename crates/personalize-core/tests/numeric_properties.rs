//! Property tests for the numeric building blocks: softmax, cosine
//! similarity, belief fusion and the Beta summary.

use personalize_core::classifier::math::{cosine_similarity, softmax};
use personalize_core::{beta_summary, BeliefFusionEngine, Distribution, LikelihoodSignal};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const LABELS: [&str; 4] = ["GAMING", "PROFESSIONAL", "BUDGET", "DEFAULT"];

/// A strictly positive distribution over the four intents.
fn arb_prior() -> impl Strategy<Value = Distribution> {
    prop::collection::vec(0.01f64..1.0, LABELS.len()).prop_map(|weights| {
        let total: f64 = weights.iter().sum();
        LABELS
            .iter()
            .zip(weights)
            .map(|(label, w)| (*label, w / total))
            .collect()
    })
}

/// A signal carrying likelihoods for a random subset of intents.
fn arb_signal() -> impl Strategy<Value = LikelihoodSignal> {
    (
        "[a-z]{3,10}",
        prop::collection::vec(prop::option::of(0.05f64..3.0), LABELS.len()),
    )
        .prop_map(|(name, weights)| {
            let likelihoods: Distribution = LABELS
                .iter()
                .zip(weights)
                .filter_map(|(label, w)| w.map(|w| (*label, w)))
                .collect();
            LikelihoodSignal::new(name, likelihoods)
        })
}

fn arb_vector(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-10.0f64..10.0, len)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn softmax_sums_to_one(scores in prop::collection::vec(-50.0f64..50.0, 1..12)) {
        let probs = softmax(&scores);
        prop_assert_eq!(probs.len(), scores.len());
        let total: f64 = probs.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn softmax_preserves_order(scores in prop::collection::vec(-50.0f64..50.0, 2..12)) {
        let probs = softmax(&scores);
        for i in 0..scores.len() {
            for j in 0..scores.len() {
                if scores[i] >= scores[j] {
                    prop_assert!(probs[i] >= probs[j]);
                }
            }
        }
    }

    #[test]
    fn cosine_is_scale_invariant(
        (a, b) in (1usize..16).prop_flat_map(|n| (arb_vector(n), arb_vector(n))),
        scale in 0.1f64..100.0,
    ) {
        let base = cosine_similarity(&a, &b);
        prop_assume!(base.is_some());
        let scaled: Vec<f64> = a.iter().map(|x| x * scale).collect();
        let rescaled = cosine_similarity(&scaled, &b).unwrap();
        let base = base.unwrap();
        prop_assert!((base - rescaled).abs() < 1e-9);
        prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&base));
    }

    #[test]
    fn cosine_rejects_length_mismatch(a in arb_vector(3), b in arb_vector(4)) {
        prop_assert!(cosine_similarity(&a, &b).is_none());
    }

    #[test]
    fn fusion_keeps_one_step_per_signal(
        prior in arb_prior(),
        signals in prop::collection::vec(arb_signal(), 0..6),
    ) {
        let state = BeliefFusionEngine::new().fuse(&prior, &signals);
        prop_assert_eq!(state.update_history.len(), signals.len());
        prop_assert!((state.final_beliefs.total() - 1.0).abs() < 1e-9);
        for (step, signal) in state.update_history.iter().zip(&signals) {
            prop_assert_eq!(&step.signal, &signal.name);
            prop_assert!((step.posterior.total() - 1.0).abs() < 1e-9);
            prop_assert_eq!(step.likelihood.len(), LABELS.len());
        }
    }

    #[test]
    fn fusion_without_signals_is_identity(prior in arb_prior()) {
        let state = BeliefFusionEngine::new().fuse(&prior, &[]);
        prop_assert_eq!(state.final_beliefs, prior);
        prop_assert!(state.update_history.is_empty());
    }

    #[test]
    fn beta_interval_brackets_mean(successes in 0u64..10_000, failures in 0u64..10_000) {
        let summary = beta_summary(successes, failures);
        let (lo, hi) = summary.interval;
        prop_assert!(0.0 <= lo && lo <= summary.mean);
        prop_assert!(summary.mean <= hi && hi <= 1.0);
        prop_assert!(summary.variance > 0.0);
    }
}
