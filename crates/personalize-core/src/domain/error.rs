//! Error taxonomy for the personalization pipeline.
//!
//! Only failures that happen before a run can start (asset loading, invalid
//! configuration) are errors. Degraded classification and render failures
//! are reported inside the run's results instead.

use personalize_remote::RemoteError;

/// Personalization errors.
#[derive(Debug, thiserror::Error)]
pub enum PersonalizeError {
    #[error("asset loading failed: {0}")]
    AssetLoading(#[from] RemoteError),

    #[error("invalid template registry: {0}")]
    InvalidRegistry(String),

    #[error("invalid intent vectors: {0}")]
    InvalidIntentVectors(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for PersonalizeError {
    fn from(err: toml::de::Error) -> Self {
        PersonalizeError::Config(err.to_string())
    }
}

impl From<url::ParseError> for PersonalizeError {
    fn from(err: url::ParseError) -> Self {
        PersonalizeError::InvalidUrl(err.to_string())
    }
}

/// Result type for personalization operations.
pub type Result<T> = std::result::Result<T, PersonalizeError>;
