//! Text embedders used to build and query the product index.
//!
//! - `FastEmbedder`: all-MiniLM-L6-v2 via fastembed (default)
//! - `HashEmbedder`: FNV-1a feature hashing, deterministic and model-free

mod minilm;
mod hash;

pub use self::minilm::FastEmbedder;
pub use self::hash::HashEmbedder;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::core::config::EmbeddingSettings;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("embedding failed: {0}")]
    Inference(String),
    #[error("unknown embedder '{0}'")]
    UnknownEmbedder(String),
}

/// Encodes text into fixed-dimension vectors.
///
/// Implementations must be deterministic: the same text always produces
/// the same vector for a given embedder id.
pub trait Embedder: Send + Sync {
    /// Stable identifier, e.g. `minilm-384`.
    fn id(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Inference("embedder returned no vector".to_string()))
    }
}

/// Resolves the configured embedder.
pub fn embedder_from_settings(
    settings: &EmbeddingSettings,
    cache_dir: &Path,
) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match settings.model.as_str() {
        "minilm" => Ok(Arc::new(FastEmbedder::new(cache_dir)?)),
        "hash" => Ok(Arc::new(HashEmbedder::new(settings.dimension))),
        other => Err(EmbeddingError::UnknownEmbedder(other.to_string())),
    }
}
