//! Error types for personalize-remote

use thiserror::Error;

/// Errors that can occur while talking to remote collaborators
#[derive(Error, Debug)]
pub enum RemoteError {
    /// No API key configured for the embedding service
    #[error("embedding service API key is not configured")]
    MissingApiKey,

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Remote answered with a non-success status
    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Call did not finish within its time budget
    #[error("timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Response arrived but did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Resource was fetched but is not an image
    #[error("not an image: {src} (content-type {content_type})")]
    NotAnImage { src: String, content_type: String },

    /// Local asset missing
    #[error("asset not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for RemoteError {
    /// Drops the request URL so credentials and query strings never reach
    /// logs or decision records.
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Http(err.without_url().to_string())
    }
}
