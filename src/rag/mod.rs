//! Product index and semantic retrieval.
//!
//! - `VectorIndex`: exact L2 index over catalog embeddings, row-aligned with the catalog
//! - `SemanticRetriever`: query encoding, nearest-neighbour search, popularity re-rank

mod index;
mod retriever;

pub use index::{build_index, IndexError, VectorIndex};
pub use retriever::{RetrievalError, SearchHit, SemanticRetriever};
