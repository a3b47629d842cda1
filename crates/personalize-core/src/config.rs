//! Pipeline configuration.
//!
//! Every tuning constant of the pipeline lives here (keyword lists, heuristic
//! confidences, timeouts, default strings) so deployments can adjust them
//! without code changes. Loaded from TOML; `PERSONALIZE_*` environment
//! variables override individual fields.

use personalize_remote::{AssetSource, EmbeddingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::domain::context::ReferrerKind;
use crate::domain::error::{PersonalizeError, Result};
use crate::domain::intents;
use crate::domain::selection::SelectionStrategy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalizeConfig {
    pub embedding: EmbeddingConfig,
    pub classifier: ClassifierConfig,
    pub signals: SignalConfig,
    pub selector: SelectorConfig,
    pub renderer: RendererConfig,
    pub assets: AssetConfig,
}

impl PersonalizeConfig {
    /// Read a TOML file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: PersonalizeConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Overlay `PERSONALIZE_*` environment variables.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(v) = std::env::var("PERSONALIZE_REGISTRY") {
            self.assets.registry = AssetSource::parse(&v);
        }
        if let Ok(v) = std::env::var("PERSONALIZE_INTENT_VECTORS") {
            self.assets.intent_vectors = AssetSource::parse(&v);
        }
        if let Ok(v) = std::env::var("PERSONALIZE_IMAGE_ROOT") {
            self.assets.image_root = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("PERSONALIZE_EMBED_TIMEOUT_MS") {
            self.classifier.embedding_timeout_ms = v.parse().map_err(|_| {
                PersonalizeError::Config(format!("PERSONALIZE_EMBED_TIMEOUT_MS: {v:?}"))
            })?;
        }
        if let Ok(v) = std::env::var("PERSONALIZE_SELECTION_STRATEGY") {
            self.selector.strategy = match v.as_str() {
                "point_estimate" => SelectionStrategy::PointEstimate,
                "thompson_draw" => SelectionStrategy::ThompsonDraw,
                other => {
                    return Err(PersonalizeError::Config(format!(
                        "PERSONALIZE_SELECTION_STRATEGY: unknown strategy {other:?}"
                    )))
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject confidences outside [0, 1] and non-positive likelihoods.
    pub fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        let mut confidences = vec![c.default_confidence, c.referrer_default_confidence];
        confidences.extend(c.keyword_rules.iter().map(|r| r.confidence));
        confidences.extend(c.referrer_rules.iter().map(|r| r.confidence));
        if confidences.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(PersonalizeError::Config(
                "classifier confidences must lie in [0, 1]".to_string(),
            ));
        }
        if self
            .signals
            .referrer_likelihoods
            .iter()
            .any(|l| !l.weight.is_finite() || l.weight < 0.0)
        {
            return Err(PersonalizeError::Config(
                "likelihood weights must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// One keyword list of the rule-based fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordRule {
    pub intent: String,
    pub confidence: f64,
    pub keywords: Vec<String>,
}

/// Referrer heuristic used when the query is empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferrerRule {
    pub referrer: ReferrerKind,
    pub intent: String,
    pub confidence: f64,
    pub rationale: String,
}

/// Intent classifier tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Hard budget for the remote embedding call.
    pub embedding_timeout_ms: u64,

    /// Scanned in order; the first list with a substring hit wins.
    pub keyword_rules: Vec<KeywordRule>,

    pub default_intent: String,
    pub default_confidence: f64,

    pub referrer_rules: Vec<ReferrerRule>,
    pub referrer_default_confidence: f64,

    /// Decimal places kept in reported confidences and similarities.
    pub report_precision: u32,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            embedding_timeout_ms: 3000,
            keyword_rules: vec![
                KeywordRule {
                    intent: intents::GAMING.to_string(),
                    confidence: 0.85,
                    keywords: words(&["gaming", "game", "fps", "hz", "esports", "rgb"]),
                },
                KeywordRule {
                    intent: intents::PROFESSIONAL.to_string(),
                    confidence: 0.82,
                    keywords: words(&[
                        "work",
                        "office",
                        "professional",
                        "productivity",
                        "design",
                        "photo",
                    ]),
                },
                KeywordRule {
                    intent: intents::BUDGET.to_string(),
                    confidence: 0.80,
                    keywords: words(&["cheap", "budget", "affordable", "deal", "discount", "price"]),
                },
            ],
            default_intent: intents::DEFAULT.to_string(),
            default_confidence: 0.50,
            referrer_rules: vec![
                ReferrerRule {
                    referrer: ReferrerKind::SocialVideo,
                    intent: intents::GAMING.to_string(),
                    confidence: 0.70,
                    rationale: "video referrer suggests entertainment/gaming intent".to_string(),
                },
                ReferrerRule {
                    referrer: ReferrerKind::SocialProfessional,
                    intent: intents::PROFESSIONAL.to_string(),
                    confidence: 0.72,
                    rationale: "professional-network referrer suggests professional intent"
                        .to_string(),
                },
            ],
            referrer_default_confidence: 0.60,
            report_precision: 3,
        }
    }
}

/// Referrer-derived likelihood for one intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferrerLikelihood {
    pub referrer: ReferrerKind,
    pub intent: String,
    pub weight: f64,
}

/// Auxiliary signals fed to belief fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Intents not listed for the visitor's referrer get weight 1.0.
    pub referrer_likelihoods: Vec<ReferrerLikelihood>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            referrer_likelihoods: vec![
                ReferrerLikelihood {
                    referrer: ReferrerKind::SocialVideo,
                    intent: intents::GAMING.to_string(),
                    weight: 0.8,
                },
                ReferrerLikelihood {
                    referrer: ReferrerKind::SocialProfessional,
                    intent: intents::PROFESSIONAL.to_string(),
                    weight: 0.8,
                },
            ],
        }
    }
}

/// Template selector settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub strategy: SelectionStrategy,
}

/// Strings used when a template leaves a field empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContentDefaults {
    pub headline: String,
    pub subheadline: String,
    pub cta_text: String,
    pub cta_link: String,
}

impl Default for ContentDefaults {
    fn default() -> Self {
        Self {
            headline: "Premium Displays".to_string(),
            subheadline: "Find your perfect monitor".to_string(),
            cta_text: "Shop Now".to_string(),
            cta_link: "#products".to_string(),
        }
    }
}

/// Content renderer timing and copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub image_timeout_ms: u64,
    /// Cosmetic fade-out delay.
    pub transition_ms: u64,
    /// How long the error surface stays visible.
    pub error_dismiss_ms: u64,
    pub error_message: String,
    pub defaults: ContentDefaults,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            image_timeout_ms: 3000,
            transition_ms: 200,
            error_dismiss_ms: 3000,
            error_message: "Personalization unavailable - showing default".to_string(),
            defaults: ContentDefaults::default(),
        }
    }
}

/// Where static assets come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub registry: AssetSource,
    pub intent_vectors: AssetSource,
    /// Directory that relative image paths resolve against.
    pub image_root: Option<PathBuf>,
    /// Site URL that relative image paths resolve against (wins over `image_root`).
    pub site_url: Option<Url>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            registry: AssetSource::parse("public/template-registry.json"),
            intent_vectors: AssetSource::parse("public/intent-embeddings.json"),
            image_root: None,
            site_url: None,
        }
    }
}
