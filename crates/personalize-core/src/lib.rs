//! Personalize Core Library
//!
//! The real-time hero personalization pipeline:
//! context collection → intent classification → belief fusion →
//! template selection → rendering, plus the decision record that audits
//! each run.

pub mod assets;
pub mod classifier;
pub mod collector;
pub mod config;
pub mod demo;
pub mod domain;
pub mod fusion;
pub mod metrics;
pub mod obs;
pub mod pipeline;
pub mod preload;
pub mod race;
pub mod render;
pub mod selector;
pub mod sink;
pub mod telemetry;

pub use domain::{
    intents, BeliefState, BeliefStep, ClassificationMethod, ClassificationResult, ContextSnapshot,
    DecisionRecord, DeviceClass, Distribution, ImageResolution, LabeledMap, LikelihoodSignal,
    PerformanceCounters, PersonalizeError, ReferrerKind, RenderOutcome, RenderPhase, Result,
    SelectionResult, SelectionStrategy, StageTimings, TemplateContent, TemplateRecord,
    TemplateRegistry, UtmAttributes, Viewport,
};

pub use assets::{http_image_loader, AssetBundle, IntentVectors};
pub use classifier::IntentClassifier;
pub use collector::{ContextCollector, PageRequest};
pub use config::{
    AssetConfig, ClassifierConfig, ContentDefaults, KeywordRule, PersonalizeConfig,
    ReferrerLikelihood, ReferrerRule, RendererConfig, SelectorConfig, SignalConfig,
};
pub use demo::{clear_forced_intent, force_intent};
pub use fusion::BeliefFusionEngine;
pub use pipeline::PersonalizationPipeline;
pub use preload::{ImagePreloader, PreloadReport};
pub use render::{
    ContentRenderer, HeroState, MemoryRenderTarget, RenderTarget, Slot, TargetDocument,
};
pub use selector::{
    beta_summary, BetaSummary, MemoryTemplateStats, TemplateSelector, TemplateStatsStore,
};
pub use sink::{
    write_decision_json, DecisionSink, JsonFileDecisionSink, MemoryDecisionSink,
    TracingDecisionSink,
};

pub use metrics::METRICS;
pub use obs::{
    emit_classification_degraded, emit_digest_failed, emit_publish_failed, emit_render_failed,
    emit_run_finished, emit_run_started, emit_stage_completed, run_span,
};
pub use telemetry::init_tracing;

/// Personalize version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
