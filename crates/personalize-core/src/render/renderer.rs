//! Validated, fallback-capable hero content swap.
//!
//! `validating → transitioning_out → loading_image → swapping_content →
//! transitioning_in → done`, with `error` reachable only from validation.
//! Nothing on the target is written until validation has passed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use personalize_remote::ImageLoader;

use crate::classifier::math::round_to;
use crate::config::RendererConfig;
use crate::domain::render::{ImageResolution, RenderOutcome, RenderPhase};
use crate::domain::template::{TemplateContent, TemplateRecord};
use crate::metrics::METRICS;
use crate::obs;
use crate::race::first_or_timeout;
use crate::render::target::{RenderTarget, Slot};

/// Opacities applied while content is swapped.
const FADED_IMAGE: f64 = 0.3;
const FADED_TEXT: f64 = 0.2;
const FADED_BADGES: f64 = 0.0;
const VISIBLE: f64 = 1.0;

/// What the image step settled on.
struct ImageChoice<'a> {
    content_from: &'a TemplateRecord,
    src: Option<&'a str>,
    resolution: ImageResolution,
    fallback_used: bool,
}

/// Applies templates to a [`RenderTarget`].
pub struct ContentRenderer {
    target: Arc<dyn RenderTarget>,
    images: Arc<dyn ImageLoader>,
    config: RendererConfig,
    /// Bumped on every shown error; a dismiss timer only fires for its own.
    error_generation: Arc<AtomicU64>,
}

impl ContentRenderer {
    pub fn new(
        target: Arc<dyn RenderTarget>,
        images: Arc<dyn ImageLoader>,
        config: RendererConfig,
    ) -> Self {
        Self {
            target,
            images,
            config,
            error_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn render(
        &self,
        template: &TemplateRecord,
        fallback: Option<&TemplateRecord>,
    ) -> RenderOutcome {
        let started = Instant::now();
        let mut phases = vec![RenderPhase::Validating];

        let primary_src = match self.validate(template) {
            Ok(src) => src,
            Err(error) => {
                phases.push(RenderPhase::Error);
                return self.fail(template, error, phases, started);
            }
        };

        phases.push(RenderPhase::TransitioningOut);
        self.fade_out();
        if self.config.transition_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.transition_ms)).await;
        }

        phases.push(RenderPhase::LoadingImage);
        let choice = self.resolve_image(template, primary_src, fallback).await;
        if choice.fallback_used {
            METRICS.inc_fallback_renders();
        }

        phases.push(RenderPhase::SwappingContent);
        if let Some(src) = choice.src {
            self.target.set_image(src);
        }
        self.swap_content(&choice.content_from.content);

        phases.push(RenderPhase::TransitioningIn);
        self.fade_in();

        phases.push(RenderPhase::Done);
        tracing::debug!(
            template_id = %choice.content_from.template_id,
            image = ?choice.resolution,
            "hero content swapped"
        );

        RenderOutcome {
            success: true,
            template_applied: Some(choice.content_from.template_id.clone()),
            fallback_used: choice.fallback_used,
            image: Some(choice.resolution),
            elapsed_ms: elapsed_ms(started),
            error: None,
            phases,
        }
    }

    /// Required slots present and the template names an image.
    fn validate<'a>(&self, template: &'a TemplateRecord) -> Result<&'a str, String> {
        let missing: Vec<&str> = Slot::REQUIRED
            .iter()
            .filter(|slot| !self.target.has_slot(**slot))
            .map(Slot::id)
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing required elements: {}", missing.join(", ")));
        }
        template
            .hero_image()
            .ok_or_else(|| format!("template {} is missing hero_image", template.template_id))
    }

    fn fail(
        &self,
        template: &TemplateRecord,
        error: String,
        phases: Vec<RenderPhase>,
        started: Instant,
    ) -> RenderOutcome {
        obs::emit_render_failed(&template.template_id, &error);
        METRICS.inc_render_failures();
        self.show_transient_error();
        RenderOutcome {
            success: false,
            template_applied: None,
            fallback_used: false,
            image: None,
            elapsed_ms: elapsed_ms(started),
            error: Some(error),
            phases,
        }
    }

    /// Show the error surface and hide it again after the dismiss delay.
    fn show_transient_error(&self) {
        if !self.target.has_slot(Slot::ErrorSurface) {
            return;
        }
        self.target.show_error(&self.config.error_message);
        let generation = self.error_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.error_generation.clone();
        let target = self.target.clone();
        let dismiss = Duration::from_millis(self.config.error_dismiss_ms);
        tokio::spawn(async move {
            tokio::time::sleep(dismiss).await;
            if current.load(Ordering::SeqCst) == generation {
                target.hide_error();
            }
        });
    }

    async fn resolve_image<'a>(
        &self,
        template: &'a TemplateRecord,
        primary_src: &'a str,
        fallback: Option<&'a TemplateRecord>,
    ) -> ImageChoice<'a> {
        if self.try_load(primary_src).await {
            return ImageChoice {
                content_from: template,
                src: Some(primary_src),
                resolution: ImageResolution::Primary,
                fallback_used: false,
            };
        }

        let Some(fallback) = fallback else {
            return ImageChoice {
                content_from: template,
                src: None,
                resolution: ImageResolution::Unresolved,
                fallback_used: false,
            };
        };

        // A fallback sharing the primary's image would fail the same way.
        let fallback_src = fallback.hero_image().filter(|src| *src != primary_src);
        let loaded = match fallback_src {
            Some(src) => self.try_load(src).await,
            None => false,
        };

        ImageChoice {
            content_from: fallback,
            src: if loaded { fallback_src } else { None },
            resolution: if loaded {
                ImageResolution::Fallback
            } else {
                ImageResolution::Unresolved
            },
            fallback_used: true,
        }
    }

    /// Load one image under the configured timeout.
    async fn try_load(&self, src: &str) -> bool {
        let images = self.images.clone();
        let owned = src.to_string();
        let budget = Duration::from_millis(self.config.image_timeout_ms);
        match first_or_timeout(budget, async move { images.load(&owned).await }).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                tracing::warn!(src = %src, error = %err, "image failed to load");
                false
            }
            Err(lost) => {
                tracing::warn!(src = %src, reason = %lost, "image load abandoned");
                false
            }
        }
    }

    fn fade_out(&self) {
        self.target.set_loading(true);
        self.target.set_opacity(Slot::Image, FADED_IMAGE);
        for slot in [Slot::Headline, Slot::Subheading, Slot::CallToAction] {
            self.target.set_opacity(slot, FADED_TEXT);
        }
        self.target.set_opacity(Slot::Badges, FADED_BADGES);
    }

    fn fade_in(&self) {
        for slot in [
            Slot::Image,
            Slot::Headline,
            Slot::Subheading,
            Slot::CallToAction,
            Slot::Badges,
        ] {
            self.target.set_opacity(slot, VISIBLE);
        }
        self.target.set_loading(false);
    }

    fn swap_content(&self, content: &TemplateContent) {
        let defaults = &self.config.defaults;
        let or_default = |value: &Option<String>, default: &str| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        self.target.set_text(
            Slot::Headline,
            &or_default(&content.headline, &defaults.headline),
        );
        self.target.set_text(
            Slot::Subheading,
            &or_default(&content.subheadline, &defaults.subheadline),
        );
        self.target.set_text(
            Slot::CallToAction,
            &or_default(&content.cta_text, &defaults.cta_text),
        );
        self.target
            .set_link(&or_default(&content.cta_link, &defaults.cta_link));
        self.target.replace_badges(&content.badges);
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    round_to(started.elapsed().as_secs_f64() * 1000.0, 2)
}
