//! Personalization pipeline orchestration.
//!
//! One run: collect context → classify intent → fuse beliefs → select
//! template → render, strictly in sequence. Each stage owns its own
//! degradation policy, so nothing here retries. The pipeline holds no
//! per-run state; `run` can be called repeatedly or concurrently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use personalize_remote::{EmbeddingProvider, GeminiEmbeddingClient, ImageLoader};
use tracing::Instrument;
use uuid::Uuid;

use crate::assets::{http_image_loader, AssetBundle};
use crate::classifier::math::round_to;
use crate::classifier::IntentClassifier;
use crate::collector::{ContextCollector, PageRequest};
use crate::config::{PersonalizeConfig, SignalConfig};
use crate::domain::belief::LikelihoodSignal;
use crate::domain::context::{ContextSnapshot, ReferrerKind};
use crate::domain::decision::{DecisionRecord, StageTimings};
use crate::domain::error::Result;
use crate::domain::intents;
use crate::domain::labeled::Distribution;
use crate::fusion::BeliefFusionEngine;
use crate::metrics::METRICS;
use crate::obs;
use crate::preload::{ImagePreloader, PreloadReport};
use crate::render::{ContentRenderer, RenderTarget};
use crate::selector::{MemoryTemplateStats, TemplateSelector, TemplateStatsStore};
use crate::sink::{DecisionSink, TracingDecisionSink};

/// Reusable pipeline over one set of loaded assets.
pub struct PersonalizationPipeline {
    assets: Arc<AssetBundle>,
    collector: ContextCollector,
    classifier: IntentClassifier,
    fusion: BeliefFusionEngine,
    selector: TemplateSelector,
    stats: Arc<dyn TemplateStatsStore>,
    renderer: ContentRenderer,
    preloader: ImagePreloader,
    sink: Arc<dyn DecisionSink>,
    signals: SignalConfig,
}

impl PersonalizationPipeline {
    /// Stats default to the registry's counters; records go to the log.
    pub fn new(
        config: &PersonalizeConfig,
        assets: Arc<AssetBundle>,
        embedder: Arc<dyn EmbeddingProvider>,
        images: Arc<dyn ImageLoader>,
        target: Arc<dyn RenderTarget>,
    ) -> Self {
        let classifier = IntentClassifier::new(
            embedder,
            Arc::new(assets.intent_vectors().clone()),
            assets.intent_catalog(),
            config.classifier.clone(),
        );
        let preloader = ImagePreloader::new(
            images.clone(),
            Duration::from_millis(config.renderer.image_timeout_ms),
        );
        Self {
            stats: Arc::new(MemoryTemplateStats::from_registry(assets.registry())),
            collector: ContextCollector::new(),
            classifier,
            fusion: BeliefFusionEngine::new(),
            selector: TemplateSelector::new(config.selector.strategy),
            renderer: ContentRenderer::new(target, images, config.renderer.clone()),
            preloader,
            sink: Arc::new(TracingDecisionSink),
            signals: config.signals.clone(),
            assets,
        }
    }

    /// Wire the production collaborators: Gemini embeddings and the
    /// HTTP/filesystem image loader.
    pub fn from_config(
        config: &PersonalizeConfig,
        assets: Arc<AssetBundle>,
        target: Arc<dyn RenderTarget>,
    ) -> Result<Self> {
        let embedder = Arc::new(GeminiEmbeddingClient::new(config.embedding.clone())?);
        let images = Arc::new(http_image_loader(&config.assets)?);
        Ok(Self::new(config, assets, embedder, images, target))
    }

    pub fn with_stats(mut self, stats: Arc<dyn TemplateStatsStore>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DecisionSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn assets(&self) -> &AssetBundle {
        &self.assets
    }

    /// Counter store, for recording observed conversions.
    pub fn stats(&self) -> &Arc<dyn TemplateStatsStore> {
        &self.stats
    }

    /// Execute one run and publish its decision record.
    pub async fn run(&self, request: &PageRequest) -> DecisionRecord {
        let run_id = Uuid::new_v4();
        let span = obs::run_span(&run_id.to_string());
        self.run_inner(run_id, request).instrument(span).await
    }

    /// Run while preloading every hero image in the background. The
    /// preload outcome is logged and returned but is not part of the record.
    pub async fn run_with_preload(&self, request: &PageRequest) -> (DecisionRecord, PreloadReport) {
        tokio::join!(
            self.run(request),
            self.preloader.preload(self.assets.registry())
        )
    }

    async fn run_inner(&self, run_id: Uuid, request: &PageRequest) -> DecisionRecord {
        let id = run_id.to_string();
        obs::emit_run_started(&id, &request.url);
        let mut timings = StageTimings::default();

        let t = Instant::now();
        let context = self.collector.collect(request);
        timings.context = stage_done(&id, "context", t);

        let t = Instant::now();
        let semantic = self.classifier.classify(&context).await;
        timings.semantic = stage_done(&id, "semantic", t);

        let t = Instant::now();
        let signals = self.auxiliary_signals(&context, &semantic.probabilities);
        let bayesian = self.fusion.fuse(&semantic.probabilities, &signals);
        timings.bayesian = stage_done(&id, "bayesian", t);

        let t = Instant::now();
        let top_intent = bayesian
            .top_intent()
            .unwrap_or(intents::DEFAULT)
            .to_string();
        let registry = self.assets.registry();
        let thompson = self
            .selector
            .select(&top_intent, registry, self.stats.as_ref())
            .await;
        let selected_template = registry
            .template_for(&top_intent)
            .unwrap_or_else(|| self.assets.default_template())
            .clone();
        timings.thompson = stage_done(&id, "thompson", t);

        let t = Instant::now();
        let render = self
            .renderer
            .render(&selected_template, Some(self.assets.default_template()))
            .await;
        timings.render = stage_done(&id, "render", t);

        let total_time_ms = round_to(timings.total(), 2);
        let applied = render.success;
        let mut record = DecisionRecord {
            run_id,
            timestamp: Utc::now(),
            context,
            semantic,
            bayesian,
            thompson,
            selected_template,
            render,
            timings,
            total_time_ms,
            applied,
            digest: None,
        };

        let digest = match record.seal() {
            Ok(digest) => digest.to_string(),
            Err(err) => {
                obs::emit_digest_failed(&id, &err);
                String::new()
            }
        };
        obs::emit_run_finished(
            &id,
            &top_intent,
            record
                .render
                .template_applied
                .as_deref()
                .unwrap_or(&record.selected_template.template_id),
            total_time_ms,
            applied,
            &digest,
        );
        METRICS.inc_runs_completed();

        if let Err(err) = self.sink.publish(&record).await {
            obs::emit_publish_failed(&id, &err);
        }
        record
    }

    /// Likelihood signals derived from context. Currently one: the referrer,
    /// emitted only for non-direct traffic.
    fn auxiliary_signals(
        &self,
        context: &ContextSnapshot,
        beliefs: &Distribution,
    ) -> Vec<LikelihoodSignal> {
        if context.referrer_kind == ReferrerKind::Direct {
            return Vec::new();
        }
        let likelihoods: Distribution = beliefs
            .labels()
            .map(|intent| {
                let weight = self
                    .signals
                    .referrer_likelihoods
                    .iter()
                    .find(|l| l.referrer == context.referrer_kind && l.intent == intent)
                    .map(|l| l.weight)
                    .unwrap_or(1.0);
                (intent, weight)
            })
            .collect();
        vec![LikelihoodSignal::new("referrer", likelihoods)]
    }
}

fn stage_done(run_id: &str, stage: &str, started: Instant) -> f64 {
    let ms = round_to(started.elapsed().as_secs_f64() * 1000.0, 2);
    obs::emit_stage_completed(run_id, stage, ms);
    ms
}
