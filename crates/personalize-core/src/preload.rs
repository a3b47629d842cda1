//! Best-effort hero image preloading.
//!
//! Runs alongside a pipeline run to warm image caches. It shares nothing
//! with the run and never fails; its outcome is only logged.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use personalize_remote::ImageLoader;
use serde::{Deserialize, Serialize};

use crate::classifier::math::round_to;
use crate::domain::template::TemplateRegistry;
use crate::race::first_or_timeout;

/// Summary of one preload pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PreloadReport {
    pub requested: usize,
    pub loaded: usize,
    pub failed: Vec<String>,
    pub elapsed_ms: f64,
}

/// Loads every distinct template hero image concurrently.
pub struct ImagePreloader {
    images: Arc<dyn ImageLoader>,
    timeout: Duration,
}

impl ImagePreloader {
    pub fn new(images: Arc<dyn ImageLoader>, timeout: Duration) -> Self {
        Self { images, timeout }
    }

    pub async fn preload(&self, registry: &TemplateRegistry) -> PreloadReport {
        let started = Instant::now();

        let mut sources: Vec<String> = Vec::new();
        for template in registry.templates.values() {
            if let Some(src) = template.hero_image() {
                if !sources.iter().any(|s| s == src) {
                    sources.push(src.to_string());
                }
            }
        }

        let attempts = sources.iter().map(|src| {
            let images = self.images.clone();
            let owned = src.clone();
            async move {
                let outcome =
                    first_or_timeout(self.timeout, async move { images.load(&owned).await })
                        .await;
                match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(err)) => {
                        tracing::debug!(src = %src, error = %err, "preload failed");
                        Some(src.clone())
                    }
                    Err(lost) => {
                        tracing::debug!(src = %src, reason = %lost, "preload abandoned");
                        Some(src.clone())
                    }
                }
            }
        });
        let failed: Vec<String> = join_all(attempts).await.into_iter().flatten().collect();

        let report = PreloadReport {
            requested: sources.len(),
            loaded: sources.len() - failed.len(),
            failed,
            elapsed_ms: round_to(started.elapsed().as_secs_f64() * 1000.0, 2),
        };
        tracing::info!(
            requested = report.requested,
            loaded = report.loaded,
            failed = report.failed.len(),
            elapsed_ms = report.elapsed_ms,
            "images preloaded"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::{TemplateContent, TemplateRecord};
    use personalize_remote::fakes::{ImageScript, ScriptedImageLoader};

    fn with_image(id: &str, src: &str) -> TemplateRecord {
        TemplateRecord::new(
            id,
            TemplateContent {
                hero_image: Some(src.to_string()),
                ..Default::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_dedupes_and_counts_failures() {
        let registry = TemplateRegistry {
            templates: [
                ("GAMING", with_image("g", "/g.jpg")),
                ("BUDGET", with_image("b", "/shared.jpg")),
                ("DEFAULT", with_image("d", "/shared.jpg")),
                ("PROFESSIONAL", with_image("p", "/p.jpg")),
            ]
            .into_iter()
            .collect(),
            priors: None,
        };
        let loader = Arc::new(
            ScriptedImageLoader::new()
                .with("/g.jpg", ImageScript::Fails)
                .with("/p.jpg", ImageScript::Stalls(Duration::from_secs(30))),
        );
        let report = ImagePreloader::new(loader.clone(), Duration::from_secs(3))
            .preload(&registry)
            .await;

        assert_eq!(report.requested, 3);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.failed, vec!["/g.jpg".to_string(), "/p.jpg".to_string()]);
    }
}
