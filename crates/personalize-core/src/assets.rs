//! Static assets loaded before any run: the template registry and the intent
//! reference vectors.
//!
//! Loading failures are fatal. Without assets no personalization is attempted
//! and the page keeps its unpersonalized default state.

use personalize_remote::{AssetFetcher, HttpImageLoader};

use crate::config::AssetConfig;
use crate::domain::error::{PersonalizeError, Result};
use crate::domain::intents;
use crate::domain::labeled::LabeledMap;
use crate::domain::template::{TemplateRecord, TemplateRegistry};

/// Reference embedding per intent label.
pub type IntentVectors = LabeledMap<Vec<f64>>;

/// Intents known when the registry carries no priors.
const DEFAULT_CATALOG: [&str; 4] = [
    intents::GAMING,
    intents::PROFESSIONAL,
    intents::BUDGET,
    intents::DEFAULT,
];

/// Validated registry plus intent vectors.
#[derive(Debug, Clone)]
pub struct AssetBundle {
    registry: TemplateRegistry,
    vectors: IntentVectors,
    default_template: TemplateRecord,
}

impl AssetBundle {
    pub fn new(registry: TemplateRegistry, vectors: IntentVectors) -> Result<Self> {
        registry.validate()?;
        validate_vectors(&vectors)?;
        let default_template = registry
            .default_template()
            .cloned()
            .ok_or_else(|| PersonalizeError::InvalidRegistry("missing DEFAULT template".into()))?;
        Ok(Self {
            registry,
            vectors,
            default_template,
        })
    }

    /// Fetch both assets concurrently.
    pub async fn load(config: &AssetConfig) -> Result<Self> {
        let fetcher = AssetFetcher::new()?;
        Self::load_with(&fetcher, config).await
    }

    pub async fn load_with(fetcher: &AssetFetcher, config: &AssetConfig) -> Result<Self> {
        let (registry, vectors) = tokio::try_join!(
            fetcher.fetch::<TemplateRegistry>(&config.registry),
            fetcher.fetch::<IntentVectors>(&config.intent_vectors),
        )?;
        let bundle = Self::new(registry, vectors)?;
        tracing::info!(
            templates = bundle.registry.templates.len(),
            intents = bundle.vectors.len(),
            "assets loaded"
        );
        Ok(bundle)
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn intent_vectors(&self) -> &IntentVectors {
        &self.vectors
    }

    /// The renderer's fallback for every run.
    pub fn default_template(&self) -> &TemplateRecord {
        &self.default_template
    }

    /// Every intent label the pipeline knows: registry priors (or the
    /// built-in four), then vector labels, then template labels.
    pub fn intent_catalog(&self) -> Vec<String> {
        let mut catalog: Vec<String> = Vec::new();
        let mut push = |label: &str| {
            if !catalog.iter().any(|l| l == label) {
                catalog.push(label.to_string());
            }
        };
        match &self.registry.priors {
            Some(priors) => priors.labels().for_each(&mut push),
            None => DEFAULT_CATALOG.iter().copied().for_each(&mut push),
        }
        self.vectors.labels().for_each(&mut push);
        self.registry.templates.labels().for_each(&mut push);
        push(intents::DEFAULT);
        catalog
    }
}

/// Image loader resolving relative hero images against the configured site
/// URL or, failing that, the local image root.
pub fn http_image_loader(config: &AssetConfig) -> Result<HttpImageLoader> {
    let mut loader = HttpImageLoader::new()?;
    if let Some(base) = &config.site_url {
        loader = loader.with_base_url(base.clone());
    }
    if let Some(root) = &config.image_root {
        loader = loader.with_asset_root(root.clone());
    }
    Ok(loader)
}

fn validate_vectors(vectors: &IntentVectors) -> Result<()> {
    let Some(dim) = vectors.values().next().map(Vec::len) else {
        return Err(PersonalizeError::InvalidIntentVectors(
            "no intent vectors".to_string(),
        ));
    };
    for (label, vector) in vectors.iter() {
        if vector.is_empty() || vector.len() != dim {
            return Err(PersonalizeError::InvalidIntentVectors(format!(
                "{label} has {} dimensions, expected {dim}",
                vector.len()
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(PersonalizeError::InvalidIntentVectors(format!(
                "{label} contains non-finite values"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use personalize_remote::{AssetSource, RemoteError};
    use tempfile::tempdir;

    const REGISTRY: &str = r#"{
        "templates": {
            "GAMING": {"template_id": "hero-gaming", "hero_image": "/g.jpg"},
            "STUDENT": {"template_id": "hero-student", "hero_image": "/s.jpg"},
            "DEFAULT": {"template_id": "hero-default", "hero_image": "/d.jpg"}
        }
    }"#;

    const VECTORS: &str = r#"{"GAMING": [1.0, 0.0], "PROFESSIONAL": [0.0, 1.0]}"#;

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("registry.json"), REGISTRY).unwrap();
        std::fs::write(dir.path().join("vectors.json"), VECTORS).unwrap();
        let config = AssetConfig {
            registry: AssetSource::Path(dir.path().join("registry.json")),
            intent_vectors: AssetSource::Path(dir.path().join("vectors.json")),
            ..Default::default()
        };

        let bundle = AssetBundle::load(&config).await.unwrap();
        assert_eq!(bundle.default_template().template_id, "hero-default");
        assert_eq!(
            bundle.intent_catalog(),
            vec!["GAMING", "PROFESSIONAL", "BUDGET", "DEFAULT", "STUDENT"]
        );
    }

    #[tokio::test]
    async fn test_missing_asset_is_fatal() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("registry.json"), REGISTRY).unwrap();
        let config = AssetConfig {
            registry: AssetSource::Path(dir.path().join("registry.json")),
            intent_vectors: AssetSource::Path(dir.path().join("missing.json")),
            ..Default::default()
        };
        let err = AssetBundle::load(&config).await.unwrap_err();
        assert!(matches!(
            err,
            PersonalizeError::AssetLoading(RemoteError::NotFound(_))
        ));
    }

    #[test]
    fn test_ragged_vectors_rejected() {
        let registry: TemplateRegistry = serde_json::from_str(REGISTRY).unwrap();
        let vectors: IntentVectors =
            serde_json::from_str(r#"{"GAMING": [1.0, 0.0], "BUDGET": [1.0]}"#).unwrap();
        let err = AssetBundle::new(registry, vectors).unwrap_err();
        assert!(err.to_string().contains("BUDGET"));
    }

    #[test]
    fn test_priors_lead_the_catalog() {
        let mut registry: TemplateRegistry = serde_json::from_str(REGISTRY).unwrap();
        registry.priors = Some([("BUDGET", 0.5), ("GAMING", 0.5)].into_iter().collect());
        let vectors: IntentVectors = serde_json::from_str(VECTORS).unwrap();
        let bundle = AssetBundle::new(registry, vectors).unwrap();
        assert_eq!(
            bundle.intent_catalog(),
            vec!["BUDGET", "GAMING", "PROFESSIONAL", "STUDENT", "DEFAULT"]
        );
    }
}
