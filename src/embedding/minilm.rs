use std::path::Path;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{Embedder, EmbeddingError};

const MINILM_DIMENSION: usize = 384;

/// all-MiniLM-L6-v2 sentence embedder.
///
/// Inference takes `&self`, so one loaded model serves concurrent queries.
pub struct FastEmbedder {
    model: TextEmbedding,
}

impl FastEmbedder {
    /// Loads the model, downloading it into `cache_dir` on first use.
    pub fn new(cache_dir: &Path) -> Result<Self, EmbeddingError> {
        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(cache_dir.to_path_buf())
            .with_show_download_progress(false);
        let model = TextEmbedding::try_new(options)
            .map_err(|err| EmbeddingError::ModelUnavailable(err.to_string()))?;
        tracing::info!("Loaded embedding model all-MiniLM-L6-v2");
        Ok(Self { model })
    }
}

impl Embedder for FastEmbedder {
    fn id(&self) -> &str {
        "minilm-384"
    }

    fn dimension(&self) -> usize {
        MINILM_DIMENSION
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|err| EmbeddingError::Inference(err.to_string()))
    }
}
