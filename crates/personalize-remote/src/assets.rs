//! Static JSON assets (template registry, intent vectors)
//!
//! Assets live either on disk or behind an http(s) URL. They are fetched
//! once at process start and treated as opaque JSON by this crate.

use crate::error::RemoteError;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use url::Url;

/// Where a JSON asset lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetSource {
    Path(PathBuf),
    Url(Url),
}

impl AssetSource {
    /// Interpret `s` as a URL when it carries an http(s) scheme, else as a path.
    pub fn parse(s: &str) -> Self {
        match Url::parse(s) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => AssetSource::Url(url),
            _ => AssetSource::Path(PathBuf::from(s)),
        }
    }
}

impl From<String> for AssetSource {
    fn from(s: String) -> Self {
        AssetSource::parse(&s)
    }
}

impl From<AssetSource> for String {
    fn from(source: AssetSource) -> Self {
        source.to_string()
    }
}

impl std::fmt::Display for AssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetSource::Path(p) => write!(f, "{}", p.display()),
            AssetSource::Url(u) => write!(f, "{}", u),
        }
    }
}

/// Fetches JSON assets from disk or over HTTP
pub struct AssetFetcher {
    http_client: reqwest::Client,
}

impl AssetFetcher {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("personalize-remote/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(AssetFetcher { http_client })
    }

    /// Fetch and decode a JSON asset.
    pub async fn fetch<T: DeserializeOwned>(&self, source: &AssetSource) -> Result<T> {
        fetch_json(&self.http_client, source).await
    }
}

/// Fetch and decode a JSON asset with a caller-supplied client.
pub async fn fetch_json<T: DeserializeOwned>(
    http_client: &reqwest::Client,
    source: &AssetSource,
) -> Result<T> {
    let bytes = match source {
        AssetSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RemoteError::NotFound(path.display().to_string())
            } else {
                RemoteError::Io(e)
            }
        })?,
        AssetSource::Url(url) => {
            let response = http_client.get(url.clone()).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(RemoteError::Status {
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }
            response.bytes().await?.to_vec()
        }
    };

    info!(source = %source, bytes = bytes.len(), "asset fetched");
    Ok(serde_json::from_slice(&bytes)?)
}
