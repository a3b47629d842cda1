//! Image availability checks
//!
//! A hero image is "loaded" when it can be fetched and looks like an image.
//! Remote sources are fetched over HTTP; anything else is treated as a path
//! on the local filesystem (optionally under an asset root).

use crate::error::RemoteError;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

/// Loads image references on behalf of the renderer and the preloader.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Resolve once `src` is usable, or fail.
    async fn load(&self, src: &str) -> Result<()>;
}

/// HTTP / filesystem image loader
pub struct HttpImageLoader {
    http_client: reqwest::Client,
    base_url: Option<Url>,
    asset_root: Option<PathBuf>,
}

impl HttpImageLoader {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("personalize-remote/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpImageLoader {
            http_client,
            base_url: None,
            asset_root: None,
        })
    }

    /// Resolve relative sources (e.g. `/images/hero.jpg`) against a site URL.
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base_url = Some(base);
        self
    }

    /// Resolve relative sources against a local directory.
    pub fn with_asset_root(mut self, root: PathBuf) -> Self {
        self.asset_root = Some(root);
        self
    }

    fn resolve(&self, src: &str) -> Resolved {
        if let Ok(url) = Url::parse(src) {
            if matches!(url.scheme(), "http" | "https") {
                return Resolved::Remote(url);
            }
        }
        if let Some(base) = &self.base_url {
            if let Ok(url) = base.join(src) {
                return Resolved::Remote(url);
            }
        }
        let relative = src.trim_start_matches('/');
        match &self.asset_root {
            Some(root) => Resolved::Local(root.join(relative)),
            None => Resolved::Local(PathBuf::from(src)),
        }
    }
}

enum Resolved {
    Remote(Url),
    Local(PathBuf),
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, src: &str) -> Result<()> {
        match self.resolve(src) {
            Resolved::Remote(url) => {
                let response = self.http_client.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(RemoteError::Status {
                        status: status.as_u16(),
                        body: String::new(),
                    });
                }
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                if !content_type.starts_with("image/") {
                    return Err(RemoteError::NotAnImage {
                        src: src.to_string(),
                        content_type,
                    });
                }
                debug!(%url, "image reachable");
                Ok(())
            }
            Resolved::Local(path) => {
                let meta = tokio::fs::metadata(&path)
                    .await
                    .map_err(|_| RemoteError::NotFound(path.display().to_string()))?;
                if !meta.is_file() {
                    return Err(RemoteError::NotFound(path.display().to_string()));
                }
                debug!(path = %path.display(), "image present on disk");
                Ok(())
            }
        }
    }
}
