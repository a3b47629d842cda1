//! Personalize-Remote: remote collaborators of the personalization pipeline
//!
//! This crate holds everything the pipeline reaches over the network or the
//! filesystem:
//! - the text-embedding service used for semantic intent classification
//! - hero image availability checks
//! - JSON asset fetches (template registry, intent reference vectors)
//!
//! Every collaborator sits behind a trait so the pipeline can be driven by the
//! in-memory fakes in [`fakes`].

pub mod assets;
pub mod embedding;
pub mod error;
pub mod fakes;
pub mod images;

pub use assets::{fetch_json, AssetFetcher, AssetSource};
pub use embedding::{EmbeddingConfig, EmbeddingProvider, GeminiEmbeddingClient};
pub use error::RemoteError;
pub use images::{HttpImageLoader, ImageLoader};

/// Result type for remote operations
pub type Result<T> = std::result::Result<T, RemoteError>;
