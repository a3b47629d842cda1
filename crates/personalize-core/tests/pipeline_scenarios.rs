//! End-to-end pipeline scenarios against in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use personalize_core::{
    AssetBundle, BeliefFusionEngine, ClassificationMethod, Distribution, HeroState, ImageResolution,
    JsonFileDecisionSink, LikelihoodSignal, MemoryDecisionSink, MemoryRenderTarget, PageRequest,
    PersonalizationPipeline, PersonalizeConfig, RenderPhase, Slot, TemplateRegistry,
};
use personalize_remote::fakes::{
    FailingEmbeddingProvider, ImageScript, ScriptedImageLoader, StalledEmbeddingProvider,
    StaticEmbeddingProvider,
};
use personalize_remote::{EmbeddingProvider, ImageLoader};
use tempfile::tempdir;

const REGISTRY: &str = r##"{
    "templates": {
        "GAMING": {
            "template_id": "hero-gaming-v2",
            "headline": "Dominate Every Frame",
            "subheadline": "240Hz panels built for esports",
            "cta_text": "Shop Gaming",
            "cta_link": "#gaming",
            "badges": ["240Hz", "1ms"],
            "hero_image": "/images/gaming.jpg",
            "successes": 42,
            "failures": 10
        },
        "PROFESSIONAL": {
            "template_id": "hero-pro",
            "headline": "Color You Can Trust",
            "subheadline": "Factory-calibrated for creative work",
            "cta_text": "Shop Pro",
            "cta_link": "#pro",
            "badges": ["99% DCI-P3"],
            "hero_image": "/images/pro.jpg"
        },
        "BUDGET": {
            "template_id": "hero-budget",
            "headline": "Great Screens, Smart Prices",
            "hero_image": "/images/budget.jpg"
        },
        "DEFAULT": {
            "template_id": "hero-default",
            "headline": "Premium Displays for Everyone",
            "subheadline": "Find your perfect monitor",
            "hero_image": "/images/default.jpg"
        }
    },
    "priors": {"GAMING": 0.3, "PROFESSIONAL": 0.4, "BUDGET": 0.2, "DEFAULT": 0.1}
}"##;

const VECTORS: &str = r#"{
    "GAMING": [0.9, 0.1, 0.0],
    "PROFESSIONAL": [0.1, 0.9, 0.1],
    "BUDGET": [0.0, 0.1, 0.9]
}"#;

fn assets() -> Arc<AssetBundle> {
    let registry: TemplateRegistry = serde_json::from_str(REGISTRY).unwrap();
    let vectors = serde_json::from_str(VECTORS).unwrap();
    Arc::new(AssetBundle::new(registry, vectors).unwrap())
}

fn config() -> PersonalizeConfig {
    let mut config = PersonalizeConfig::default();
    config.renderer.transition_ms = 0;
    config
}

struct Harness {
    pipeline: PersonalizationPipeline,
    target: Arc<MemoryRenderTarget>,
    sink: Arc<MemoryDecisionSink>,
}

fn harness(
    embedder: Arc<dyn EmbeddingProvider>,
    images: Arc<dyn ImageLoader>,
    target: MemoryRenderTarget,
) -> Harness {
    let target = Arc::new(target);
    let sink = Arc::new(MemoryDecisionSink::new());
    let pipeline =
        PersonalizationPipeline::new(&config(), assets(), embedder, images, target.clone())
            .with_sink(sink.clone());
    Harness {
        pipeline,
        target,
        sink,
    }
}

fn offline() -> Harness {
    harness(
        Arc::new(FailingEmbeddingProvider::new("service unavailable")),
        Arc::new(ScriptedImageLoader::new()),
        MemoryRenderTarget::new(),
    )
}

#[tokio::test]
async fn test_gaming_query_without_remote_service_uses_keyword_fallback() {
    let h = offline();
    let record = h
        .pipeline
        .run(&PageRequest::new("/?q=best+gaming+monitor+for+esports"))
        .await;

    assert_eq!(record.semantic.method, ClassificationMethod::RuleBasedFallback);
    assert_eq!(record.semantic.intent, "GAMING");
    assert_eq!(record.semantic.confidence, 0.85);
    assert!(record.semantic.fallback_reason.is_some());
    assert!((record.semantic.probabilities.total() - 1.0).abs() < 1e-9);

    assert_eq!(record.top_intent(), Some("GAMING"));
    let thompson = record.thompson.as_ref().unwrap();
    assert_eq!(thompson.chosen_template, "hero-gaming-v2");
    assert!((thompson.estimated_cvr - 42.0 / 52.0).abs() < 1e-12);

    let state = h.target.state();
    assert_eq!(state.headline.as_deref(), Some("Dominate Every Frame"));
    assert_eq!(state.badges, vec!["240Hz".to_string(), "1ms".to_string()]);
    assert_eq!(state.image_src.as_deref(), Some("/images/gaming.jpg"));
    assert!(record.applied);
}

#[tokio::test]
async fn test_linkedin_referrer_without_query_is_professional() {
    let h = offline();
    let record = h
        .pipeline
        .run(&PageRequest::new("/").with_referrer("https://www.linkedin.com/feed/"))
        .await;

    assert_eq!(record.semantic.method, ClassificationMethod::ReferrerHeuristic);
    assert_eq!(record.semantic.intent, "PROFESSIONAL");
    assert_eq!(record.semantic.confidence, 0.72);
    // The referrer signal damps PROFESSIONAL (0.8) but it still leads.
    assert_eq!(record.bayesian.update_history.len(), 1);
    assert_eq!(record.top_intent(), Some("PROFESSIONAL"));
    assert_eq!(record.selected_template.template_id, "hero-pro");
}

#[tokio::test]
async fn test_explicit_override_beats_query_and_referrer() {
    let h = offline();
    let record = h
        .pipeline
        .run(
            &PageRequest::new("/?q=esports+gaming&intent=BUDGET")
                .with_referrer("https://www.youtube.com/watch?v=x"),
        )
        .await;

    assert_eq!(record.semantic.method, ClassificationMethod::ExplicitOverride);
    assert_eq!(record.semantic.intent, "BUDGET");
    assert_eq!(record.semantic.confidence, 1.0);
    assert_eq!(record.top_intent(), Some("BUDGET"));
    assert_eq!(record.selected_template.template_id, "hero-budget");
}

#[tokio::test]
async fn test_remote_embedding_drives_selection() {
    let h = harness(
        Arc::new(StaticEmbeddingProvider::new(vec![0.05, 0.2, 0.95])),
        Arc::new(ScriptedImageLoader::new()),
        MemoryRenderTarget::new(),
    );
    let record = h.pipeline.run(&PageRequest::new("/?q=something+affordable")).await;

    assert_eq!(record.semantic.method, ClassificationMethod::RemoteEmbedding);
    assert_eq!(record.semantic.intent, "BUDGET");
    assert!(record.semantic.similarities.is_some());
    assert_eq!(record.selected_template.template_id, "hero-budget");
}

#[tokio::test(start_paused = true)]
async fn test_stalled_embedding_degrades_within_budget() {
    let h = harness(
        Arc::new(StalledEmbeddingProvider::new(
            Duration::from_secs(30),
            vec![0.9, 0.1, 0.0],
        )),
        Arc::new(ScriptedImageLoader::new()),
        MemoryRenderTarget::new(),
    );
    let record = h.pipeline.run(&PageRequest::new("/?q=office+monitor")).await;
    assert_eq!(record.semantic.method, ClassificationMethod::RuleBasedFallback);
    assert_eq!(record.semantic.intent, "PROFESSIONAL");
    assert!(record
        .semantic
        .fallback_reason
        .as_deref()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn test_missing_cta_slot_leaves_page_untouched() {
    let existing = HeroState {
        image_src: Some("/images/original.jpg".to_string()),
        headline: Some("Original headline".to_string()),
        subheadline: Some("Original subheadline".to_string()),
        badges: vec!["Original".to_string()],
        ..Default::default()
    };
    let h = harness(
        Arc::new(FailingEmbeddingProvider::new("offline")),
        Arc::new(ScriptedImageLoader::new()),
        MemoryRenderTarget::new()
            .without(Slot::CallToAction)
            .with_state(existing.clone()),
    );

    let record = h.pipeline.run(&PageRequest::new("/?q=gaming")).await;

    assert!(!record.applied);
    assert!(!record.render.success);
    assert!(record.render.error.as_deref().unwrap().contains("hero-cta"));
    assert_eq!(record.render.terminal_phase(), Some(RenderPhase::Error));
    assert_eq!(h.target.mutations(), 0);

    let state = h.target.state();
    assert_eq!(
        state.error.as_deref(),
        Some("Personalization unavailable - showing default")
    );
    assert_eq!(HeroState { error: None, ..state }, existing);

    tokio::time::sleep(Duration::from_millis(3100)).await;
    assert_eq!(h.target.state().error, None);
}

#[tokio::test(start_paused = true)]
async fn test_broken_primary_image_switches_to_whole_default_template() {
    let h = harness(
        Arc::new(FailingEmbeddingProvider::new("offline")),
        Arc::new(ScriptedImageLoader::new().with("/images/gaming.jpg", ImageScript::Fails)),
        MemoryRenderTarget::new(),
    );
    let record = h.pipeline.run(&PageRequest::new("/?q=rgb+setup")).await;

    assert!(record.applied);
    assert!(record.render.fallback_used);
    assert_eq!(record.render.image, Some(ImageResolution::Fallback));
    assert_eq!(record.render.template_applied.as_deref(), Some("hero-default"));

    let state = h.target.state();
    assert_eq!(state.image_src.as_deref(), Some("/images/default.jpg"));
    assert_eq!(state.headline.as_deref(), Some("Premium Displays for Everyone"));
    assert_eq!(state.cta_text.as_deref(), Some("Shop Now"));
    assert!(state.badges.is_empty());
}

#[test]
fn test_identical_signals_fuse_to_identical_bits() {
    let prior: Distribution = [("GAMING", 0.55), ("PROFESSIONAL", 0.25), ("BUDGET", 0.15), ("DEFAULT", 0.05)]
        .into_iter()
        .collect();
    let signals = vec![
        LikelihoodSignal::new("referrer", [("GAMING", 0.8)].into_iter().collect()),
        LikelihoodSignal::new("campaign", [("BUDGET", 1.7)].into_iter().collect()),
    ];
    let engine = BeliefFusionEngine::new();
    let first = engine.fuse(&prior, &signals);
    let second = engine.fuse(&prior, &signals);
    let bits = |d: &Distribution| -> Vec<u64> {
        d.values().map(|p| p.to_bits()).collect()
    };
    assert_eq!(bits(first.posterior()), bits(second.posterior()));
}

#[tokio::test]
async fn test_decision_record_shape_and_digest() {
    let h = offline();
    let record = h.pipeline.run(&PageRequest::new("/?q=cheap+monitor")).await;

    let json = serde_json::to_value(&record).unwrap();
    for key in [
        "run_id",
        "timestamp",
        "context",
        "semantic",
        "bayesian",
        "thompson",
        "selected_template",
        "render",
        "timings",
        "total_time_ms",
        "applied",
        "digest",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    let total: f64 = record.timings.stages().iter().map(|(_, ms)| ms).sum();
    assert!((record.total_time_ms - total).abs() < 0.011);

    let digest = record.digest.clone().unwrap();
    assert_eq!(digest.len(), 64);
    assert_eq!(digest, record.compute_digest().unwrap());
    assert_eq!(h.sink.latest().unwrap(), record);

    let mut tampered = record.clone();
    tampered.applied = !tampered.applied;
    assert_ne!(tampered.compute_digest().unwrap(), digest);
}

#[tokio::test]
async fn test_json_file_sink_writes_latest_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("decision.json");
    let pipeline = PersonalizationPipeline::new(
        &config(),
        assets(),
        Arc::new(FailingEmbeddingProvider::new("offline")),
        Arc::new(ScriptedImageLoader::new()),
        Arc::new(MemoryRenderTarget::new()),
    )
    .with_sink(Arc::new(JsonFileDecisionSink::new(&path)));

    let record = pipeline.run(&PageRequest::new("/?q=photo+editing")).await;
    let written: personalize_core::DecisionRecord =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written.run_id, record.run_id);
    assert_eq!(written.selected_template.template_id, "hero-pro");
}

#[tokio::test(start_paused = true)]
async fn test_preload_runs_alongside_without_affecting_record() {
    let loader = ScriptedImageLoader::new().with("/images/budget.jpg", ImageScript::Fails);
    let h = harness(
        Arc::new(FailingEmbeddingProvider::new("offline")),
        Arc::new(loader),
        MemoryRenderTarget::new(),
    );
    let (record, report) = h
        .pipeline
        .run_with_preload(&PageRequest::new("/?q=gaming"))
        .await;

    assert_eq!(report.requested, 4);
    assert_eq!(report.loaded, 3);
    assert_eq!(report.failed, vec!["/images/budget.jpg".to_string()]);
    assert!(record.applied);
    assert_eq!(record.selected_template.template_id, "hero-gaming-v2");
}

#[tokio::test]
async fn test_recorded_outcomes_feed_next_selection() {
    let h = offline();
    for _ in 0..8 {
        h.pipeline.stats().record_success("hero-gaming-v2").await;
    }
    let record = h.pipeline.run(&PageRequest::new("/?q=fps")).await;
    let thompson = record.thompson.unwrap();
    assert_eq!((thompson.successes, thompson.failures), (50, 10));
    assert_eq!(h.sink.all().len(), 1);
}
