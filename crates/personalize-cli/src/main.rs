//! Instant Personalize CLI
//!
//! The `personalize` command drives the hero personalization pipeline
//! against an in-memory page, for demos and offline debugging.
//!
//! ## Commands
//!
//! - `run`: Execute one personalization run and print its decision
//! - `classify`: Show how a page URL would be classified
//! - `force-intent`: Rewrite a URL so the next run uses a fixed intent
//! - `reset`: Remove a forced intent (and query) from a URL
//! - `preload`: Check that every template's hero image loads
//! - `config`: Print the effective configuration as TOML

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

use personalize_core::{
    clear_forced_intent, force_intent, http_image_loader, AssetBundle, ContextCollector,
    DecisionRecord, ImagePreloader, IntentClassifier, JsonFileDecisionSink, MemoryRenderTarget,
    PageRequest, PersonalizationPipeline, PersonalizeConfig, PreloadReport, TargetDocument,
    Viewport, METRICS,
};
use personalize_remote::GeminiEmbeddingClient;

#[derive(Parser)]
#[command(name = "personalize")]
#[command(author = "Instant Personalize Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time hero personalization pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (TOML); PERSONALIZE_* variables still apply
    #[arg(short, long, global = true, env = "PERSONALIZE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for one page view
    Run {
        #[command(flatten)]
        page: PageArgs,

        /// Page document (JSON) to render into; defaults to an empty page with every slot
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Write the resulting page document (JSON) here
        #[arg(long)]
        target_out: Option<PathBuf>,

        /// Write the decision record (JSON) here
        #[arg(long)]
        decision_out: Option<PathBuf>,

        /// Preload every hero image alongside the run
        #[arg(long)]
        preload: bool,

        /// Print the full decision record instead of a summary
        #[arg(long)]
        record: bool,
    },

    /// Classify a page view without selecting or rendering
    Classify {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Rewrite a URL so the next run uses a fixed intent
    ForceIntent {
        /// Page URL (absolute, or a path such as "/?q=monitors")
        url: String,

        /// Intent to force, e.g. GAMING
        intent: String,
    },

    /// Remove `intent` and `q` from a URL
    Reset {
        /// Page URL
        url: String,
    },

    /// Load every template's hero image and report failures
    Preload,

    /// Print the effective configuration as TOML
    Config,
}

#[derive(clap::Args)]
struct PageArgs {
    /// Page URL (absolute, or a path such as "/?q=gaming+monitor")
    url: String,

    /// Referring page URL
    #[arg(short, long)]
    referrer: Option<String>,

    /// Viewport as WIDTHxHEIGHT
    #[arg(long)]
    viewport: Option<Viewport>,
}

impl PageArgs {
    fn request(&self) -> PageRequest {
        let mut request = PageRequest::new(&self.url);
        if let Some(referrer) = &self.referrer {
            request = request.with_referrer(referrer);
        }
        if let Some(v) = self.viewport {
            request = request.with_viewport(v.width, v.height);
        }
        request
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    personalize_core::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Run {
            page,
            target,
            target_out,
            decision_out,
            preload,
            record,
        } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_run(
                &config,
                &page,
                target.as_deref(),
                target_out.as_deref(),
                decision_out.as_deref(),
                preload,
                record,
            )
            .await
        }
        Commands::Classify { page } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_classify(&config, &page).await
        }
        Commands::ForceIntent { url, intent } => cmd_force_intent(&url, &intent),
        Commands::Reset { url } => cmd_reset(&url),
        Commands::Preload => {
            let config = load_config(cli.config.as_deref())?;
            cmd_preload(&config).await
        }
        Commands::Config => {
            let config = load_config(cli.config.as_deref())?;
            cmd_config(&config)
        }
    };

    METRICS.flush();
    result
}

fn load_config(path: Option<&Path>) -> Result<PersonalizeConfig> {
    match path {
        Some(path) => PersonalizeConfig::load(path)
            .and_then(PersonalizeConfig::with_env_overrides)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => PersonalizeConfig::from_env().context("Invalid PERSONALIZE_* environment"),
    }
}

async fn load_assets(config: &PersonalizeConfig) -> Result<Arc<AssetBundle>> {
    let assets = AssetBundle::load(&config.assets)
        .await
        .context("Failed to load template registry and intent vectors")?;
    Ok(Arc::new(assets))
}

fn load_target(path: Option<&Path>) -> Result<MemoryRenderTarget> {
    match path {
        Some(path) => {
            let doc: TargetDocument = read_json_file(path)?;
            Ok(MemoryRenderTarget::from_document(doc))
        }
        None => Ok(MemoryRenderTarget::new()),
    }
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn write_json_file<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Run the pipeline once against an in-memory page
async fn cmd_run(
    config: &PersonalizeConfig,
    page: &PageArgs,
    target: Option<&Path>,
    target_out: Option<&Path>,
    decision_out: Option<&Path>,
    preload: bool,
    print_record: bool,
) -> Result<()> {
    let assets = load_assets(config).await?;
    let target = Arc::new(load_target(target)?);

    let mut pipeline = PersonalizationPipeline::from_config(config, assets, target.clone())
        .context("Failed to build pipeline")?;
    if let Some(path) = decision_out {
        pipeline = pipeline.with_sink(Arc::new(JsonFileDecisionSink::new(path)));
    }

    let request = page.request();
    let (record, report) = if preload {
        let (record, report) = pipeline.run_with_preload(&request).await;
        (record, Some(report))
    } else {
        (pipeline.run(&request).await, None)
    };

    if print_record {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", render_summary(&record));
        if let Some(report) = &report {
            print!("{}", render_preload(report));
        }
    }

    if let Some(path) = target_out {
        write_json_file(path, &target.document())?;
    }

    if !record.applied {
        anyhow::bail!(
            "Personalization was not applied: {}",
            record.render.error.as_deref().unwrap_or("unknown render failure")
        );
    }
    Ok(())
}

/// Classify one page view and print the result as JSON
async fn cmd_classify(config: &PersonalizeConfig, page: &PageArgs) -> Result<()> {
    let assets = load_assets(config).await?;
    let embedder = GeminiEmbeddingClient::new(config.embedding.clone())
        .context("Failed to build embedding client")?;
    let classifier = IntentClassifier::new(
        Arc::new(embedder),
        Arc::new(assets.intent_vectors().clone()),
        assets.intent_catalog(),
        config.classifier.clone(),
    );

    let context = ContextCollector::new().collect(&page.request());
    let result = classifier.classify(&context).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_force_intent(url: &str, intent: &str) -> Result<()> {
    let rewritten = force_intent(url, intent).with_context(|| format!("Invalid URL: {url}"))?;
    println!("{rewritten}");
    Ok(())
}

fn cmd_reset(url: &str) -> Result<()> {
    let rewritten = clear_forced_intent(url).with_context(|| format!("Invalid URL: {url}"))?;
    println!("{rewritten}");
    Ok(())
}

/// Preload every hero image in the registry
async fn cmd_preload(config: &PersonalizeConfig) -> Result<()> {
    let assets = load_assets(config).await?;
    let images = http_image_loader(&config.assets).context("Failed to build image loader")?;
    let preloader = ImagePreloader::new(
        Arc::new(images),
        Duration::from_millis(config.renderer.image_timeout_ms),
    );
    let report = preloader.preload(assets.registry()).await;
    print!("{}", render_preload(&report));

    if !report.failed.is_empty() {
        anyhow::bail!("{} hero image(s) failed to load", report.failed.len());
    }
    Ok(())
}

fn cmd_config(config: &PersonalizeConfig) -> Result<()> {
    let mut shown = config.clone();
    if shown.embedding.api_key.is_some() {
        shown.embedding.api_key = Some("<redacted>".to_string());
    }
    let rendered = toml::to_string_pretty(&shown).context("Failed to render config as TOML")?;
    print!("{rendered}");
    Ok(())
}

fn render_summary(record: &DecisionRecord) -> String {
    let mut out = String::new();
    let semantic = &record.semantic;

    out.push_str(&format!("Run ID: {}\n", record.run_id));
    out.push_str(&format!(
        "Context: {} referrer, {} viewport\n",
        record.context.referrer_kind, record.context.viewport
    ));
    out.push_str(&format!(
        "Classified: {} ({}, confidence {})\n",
        semantic.intent,
        semantic.method.as_str(),
        semantic.confidence
    ));
    if let Some(reason) = &semantic.fallback_reason {
        out.push_str(&format!("  Fallback: {reason}\n"));
    }
    out.push_str(&format!(
        "Belief: {} after {} update(s)\n",
        record.top_intent().unwrap_or("none"),
        record.bayesian.update_history.len()
    ));
    match &record.thompson {
        Some(selection) => out.push_str(&format!(
            "Template: {} (CVR {:.3}, 95% CI [{:.3}, {:.3}])\n",
            selection.chosen_template,
            selection.estimated_cvr,
            selection.confidence_interval.0,
            selection.confidence_interval.1
        )),
        None => out.push_str(&format!(
            "Template: {} (no template for intent, default used)\n",
            record.selected_template.template_id
        )),
    }
    let status = if record.applied {
        format!(
            "✓ applied {}{}",
            record.render.template_applied.as_deref().unwrap_or("-"),
            if record.render.fallback_used {
                " (fallback)"
            } else {
                ""
            }
        )
    } else {
        format!(
            "✗ failed: {}",
            record.render.error.as_deref().unwrap_or("unknown")
        )
    };
    out.push_str(&format!("Render: {status}\n"));

    let stages: Vec<String> = record
        .timings
        .stages()
        .iter()
        .map(|(name, ms)| format!("{name} {ms}ms"))
        .collect();
    out.push_str(&format!("Timings: {}\n", stages.join(", ")));
    out.push_str(&format!("Total: {}ms\n", record.total_time_ms));
    out
}

fn render_preload(report: &PreloadReport) -> String {
    let mut out = format!(
        "Preload: {}/{} images loaded in {}ms\n",
        report.loaded, report.requested, report.elapsed_ms
    );
    for src in &report.failed {
        out.push_str(&format!("  ✗ {src}\n"));
    }
    out
}
