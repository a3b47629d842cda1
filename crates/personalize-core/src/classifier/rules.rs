//! Deterministic local classification: keyword lists and referrer heuristics.

use crate::config::ClassifierConfig;
use crate::domain::context::ReferrerKind;

/// Intent chosen by a local rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleVerdict {
    pub intent: String,
    pub confidence: f64,
    pub rationale: String,
}

/// Scan keyword lists in order; the first list with a substring hit wins.
/// `query` is expected lower-cased.
pub fn match_keywords(query: &str, config: &ClassifierConfig) -> RuleVerdict {
    for rule in &config.keyword_rules {
        if let Some(keyword) = rule
            .keywords
            .iter()
            .find(|kw| query.contains(kw.to_lowercase().as_str()))
        {
            return RuleVerdict {
                intent: rule.intent.clone(),
                confidence: rule.confidence,
                rationale: format!("keyword \"{keyword}\" matched {}", rule.intent),
            };
        }
    }
    RuleVerdict {
        intent: config.default_intent.clone(),
        confidence: config.default_confidence,
        rationale: "no keyword matched; default intent".to_string(),
    }
}

/// Classify from the referrer alone (used when there is no query).
pub fn match_referrer(kind: ReferrerKind, config: &ClassifierConfig) -> RuleVerdict {
    match config.referrer_rules.iter().find(|r| r.referrer == kind) {
        Some(rule) => RuleVerdict {
            intent: rule.intent.clone(),
            confidence: rule.confidence,
            rationale: rule.rationale.clone(),
        },
        None => RuleVerdict {
            intent: config.default_intent.clone(),
            confidence: config.referrer_default_confidence,
            rationale: format!("{kind} referrer carries no intent signal"),
        },
    }
}
