//! Remote text-embedding service client
//!
//! The embedding service turns a free-text query into a fixed-length vector.
//! It is treated as unreliable: callers are expected to race it against a
//! timer and degrade when it fails.

use crate::error::RemoteError;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Source of query embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name for logs and decision records.
    fn name(&self) -> &str;

    /// Embed `text` into a numeric vector.
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// API base URL (without the `/models/...` suffix)
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// API key; read from `GEMINI_API_KEY` when absent
    pub api_key: Option<String>,
    /// Transport-level request timeout
    pub request_timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig {
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            model: std::env::var("GEMINI_EMBED_MODEL")
                .unwrap_or_else(|_| "gemini-embedding-001".to_string()),
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            request_timeout_ms: 3000,
        }
    }
}

impl EmbeddingConfig {
    /// Create config for a specific endpoint
    pub fn new(base_url: &str, model: &str) -> Self {
        EmbeddingConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            request_timeout_ms: 3000,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:embedContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
}

#[derive(Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f64>,
}

/// Client for the Gemini `embedContent` endpoint
pub struct GeminiEmbeddingClient {
    config: EmbeddingConfig,
    http_client: reqwest::Client,
}

impl GeminiEmbeddingClient {
    /// Create a new client
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("personalize-remote/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(GeminiEmbeddingClient {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(RemoteError::MissingApiKey)?;

        let body = EmbedRequest {
            model: format!("models/{}", self.config.model),
            content: EmbedContent {
                parts: vec![EmbedPart { text }],
            },
        };

        let response = self
            .http_client
            .post(self.config.endpoint())
            .header(API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteError::Timeout {
                        after_ms: self.config.request_timeout_ms,
                    }
                } else {
                    RemoteError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.bytes().await?;
        let parsed: EmbedResponse = serde_json::from_slice(&raw)
            .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;

        let values = parsed
            .embedding
            .map(|e| e.values)
            .ok_or_else(|| RemoteError::MalformedResponse("missing embedding.values".into()))?;

        if values.is_empty() {
            return Err(RemoteError::MalformedResponse("empty embedding".into()));
        }

        debug!(dims = values.len(), "received query embedding");
        Ok(values)
    }
}
