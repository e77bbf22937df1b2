use thiserror::Error;

use crate::catalog::CatalogError;
use crate::core::errors::ApiError;
use crate::embedding::EmbeddingError;
use crate::rag::{IndexError, RetrievalError};

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] ApiError),

    #[error("Failed to load product catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to initialize embedder: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Failed to build product index: {0}")]
    Index(#[from] IndexError),

    #[error("Failed to assemble retriever: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Failed to initialize LLM provider: {0}")]
    Llm(#[source] ApiError),

    #[error("Failed to initialize web search provider: {0}")]
    Search(#[source] ApiError),

    #[error("Startup worker failed: {0}")]
    Worker(String),
}
