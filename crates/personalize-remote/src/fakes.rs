//! In-memory fakes for the remote traits (testing and offline demos)
//!
//! Provides embedding providers that succeed, fail, or stall, and an image
//! loader whose per-source behaviour is scripted up front.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::RemoteError;
use crate::images::ImageLoader;
use crate::Result;

// ---------------------------------------------------------------------------
// Embedding providers
// ---------------------------------------------------------------------------

/// Always returns the same vector.
#[derive(Debug, Default)]
pub struct StaticEmbeddingProvider {
    vector: Vec<f64>,
    calls: AtomicUsize,
}

impl StaticEmbeddingProvider {
    pub fn new(vector: Vec<f64>) -> Self {
        Self {
            vector,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbeddingProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector.clone())
    }
}

/// Always fails with a transport error.
#[derive(Debug)]
pub struct FailingEmbeddingProvider {
    message: String,
}

impl FailingEmbeddingProvider {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f64>> {
        Err(RemoteError::Http(self.message.clone()))
    }
}

/// Answers only after `delay` has elapsed.
#[derive(Debug)]
pub struct StalledEmbeddingProvider {
    delay: Duration,
    vector: Vec<f64>,
}

impl StalledEmbeddingProvider {
    pub fn new(delay: Duration, vector: Vec<f64>) -> Self {
        Self { delay, vector }
    }
}

#[async_trait]
impl EmbeddingProvider for StalledEmbeddingProvider {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f64>> {
        tokio::time::sleep(self.delay).await;
        Ok(self.vector.clone())
    }
}

// ---------------------------------------------------------------------------
// ScriptedImageLoader
// ---------------------------------------------------------------------------

/// Behaviour of one image source in a [`ScriptedImageLoader`].
#[derive(Debug, Clone)]
pub enum ImageScript {
    Loads,
    Fails,
    Stalls(Duration),
}

/// Image loader with per-source scripted outcomes. Unscripted sources load.
#[derive(Debug, Default)]
pub struct ScriptedImageLoader {
    scripts: HashMap<String, ImageScript>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, src: &str, script: ImageScript) -> Self {
        self.scripts.insert(src.to_string(), script);
        self
    }

    /// Sources requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageLoader for ScriptedImageLoader {
    async fn load(&self, src: &str) -> Result<()> {
        self.requested.lock().unwrap().push(src.to_string());
        match self.scripts.get(src).cloned().unwrap_or(ImageScript::Loads) {
            ImageScript::Loads => Ok(()),
            ImageScript::Fails => Err(RemoteError::NotFound(src.to_string())),
            ImageScript::Stalls(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}
