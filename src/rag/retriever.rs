use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::index::{IndexError, VectorIndex};
use crate::catalog::{Catalog, CatalogEntry};
use crate::embedding::{Embedder, EmbeddingError};

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("k must be positive")]
    InvalidK,
    #[error("catalog has {catalog} rows but index has {index}")]
    Misaligned { catalog: usize, index: usize },
    #[error("embedder dimension {embedder} does not match index dimension {index}")]
    DimensionMismatch { embedder: usize, index: usize },
    #[error("index row {0} has no catalog entry")]
    DanglingRow(usize),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// A catalog entry paired with its distance to the query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub entry: CatalogEntry,
    pub distance: f32,
}

/// Encodes queries and looks them up in the shared product index.
#[derive(Clone)]
pub struct SemanticRetriever {
    catalog: Arc<Catalog>,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl SemanticRetriever {
    /// Fails unless the catalog and index have the same rows and the
    /// embedder produces vectors of the index dimension.
    pub fn new(
        catalog: Arc<Catalog>,
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrievalError> {
        if catalog.len() != index.len() {
            return Err(RetrievalError::Misaligned {
                catalog: catalog.len(),
                index: index.len(),
            });
        }
        if embedder.dimension() != index.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                embedder: embedder.dimension(),
                index: index.dimension(),
            });
        }
        Ok(Self {
            catalog,
            index,
            embedder,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn embedder_id(&self) -> &str {
        self.embedder.id()
    }

    /// Nearest `k` entries re-ranked by popularity, highest first.
    ///
    /// The sort is stable: entries with equal popularity stay in distance
    /// order. Only an empty index yields an empty result.
    pub fn retrieve_hits(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, RetrievalError> {
        if k == 0 {
            return Err(RetrievalError::InvalidK);
        }
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_one(query)?;
        let nearest = self.index.search(&query_vector, k)?;

        let mut hits = nearest
            .into_iter()
            .map(|(row, distance)| {
                self.catalog
                    .get(row)
                    .cloned()
                    .map(|entry| SearchHit { entry, distance })
                    .ok_or(RetrievalError::DanglingRow(row))
            })
            .collect::<Result<Vec<_>, _>>()?;

        hits.sort_by(|left, right| right.entry.popularity.cmp(&left.entry.popularity));
        Ok(hits)
    }

    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<CatalogEntry>, RetrievalError> {
        Ok(self
            .retrieve_hits(query, k)?
            .into_iter()
            .map(|hit| hit.entry)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::rag::build_index;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Embeds text as `[len]` so distances are easy to reason about.
    struct LengthEmbedder;

    impl Embedder for LengthEmbedder {
        fn id(&self) -> &str {
            "length"
        }

        fn dimension(&self) -> usize {
            1
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    /// Records how many `embed` calls overlap. Each call lingers until a
    /// second one arrives (or a deadline passes).
    struct OverlapEmbedder {
        inner: HashEmbedder,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl Embedder for OverlapEmbedder {
        fn id(&self) -> &str {
            self.inner.id()
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            let deadline = Instant::now() + Duration::from_secs(2);
            while self.in_flight.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(1));
            }
            self.max_in_flight
                .fetch_max(self.in_flight.load(Ordering::SeqCst), Ordering::SeqCst);
            let vectors = self.inner.embed(texts);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            vectors
        }
    }

    fn grocery_catalog() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::new(1, "Green Bananas", "fresh fruits", "produce", 3),
            CatalogEntry::new(2, "Whole Milk", "milk", "dairy eggs", 80),
            CatalogEntry::new(3, "Organic Bananas", "fresh fruits", "produce", 120),
            CatalogEntry::new(4, "Banana Chips", "dried fruits", "snacks", 3),
            CatalogEntry::new(5, "Sparkling Water", "water seltzer", "beverages", 40),
            CatalogEntry::new(6, "Baby Bananas", "fresh fruits", "produce", 0),
        ])
    }

    fn retriever(catalog: Catalog, embedder: Arc<dyn Embedder>) -> SemanticRetriever {
        let index = build_index(&catalog, embedder.as_ref(), 4).unwrap();
        SemanticRetriever::new(Arc::new(catalog), Arc::new(index), embedder).unwrap()
    }

    #[test]
    fn returns_exactly_k_sorted_by_popularity() {
        let retriever = retriever(grocery_catalog(), Arc::new(HashEmbedder::new(128)));

        let entries = retriever.retrieve("bananas", 5).unwrap();
        assert_eq!(entries.len(), 5);
        for pair in entries.windows(2) {
            assert!(pair[0].popularity >= pair[1].popularity);
        }

        let organic = entries
            .iter()
            .position(|e| e.product_name == "Organic Bananas")
            .unwrap();
        let green = entries
            .iter()
            .position(|e| e.product_name == "Green Bananas")
            .unwrap();
        assert!(organic < green);
    }

    #[test]
    fn ties_keep_distance_order() {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new(1, "aaaaaaaa", "a", "a", 7),
            CatalogEntry::new(2, "a", "a", "a", 7),
            CatalogEntry::new(3, "aaaa", "a", "a", 7),
            CatalogEntry::new(4, "aaaaaaaaaaaa", "a", "a", 9),
        ]);
        let retriever = retriever(catalog, Arc::new(LengthEmbedder));

        let hits = retriever.retrieve_hits("", 4).unwrap();
        let ids: Vec<u64> = hits.iter().map(|h| h.entry.product_id).collect();
        // product 4 wins on popularity; the rest keep nearest-first order
        assert_eq!(ids, vec![4, 2, 3, 1]);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let retriever = retriever(grocery_catalog(), Arc::new(HashEmbedder::new(64)));
        let first = retriever.retrieve("fruit snacks", 4).unwrap();
        let second = retriever.retrieve("fruit snacks", 4).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn irrelevant_query_still_returns_k() {
        let retriever = retriever(grocery_catalog(), Arc::new(HashEmbedder::new(64)));
        assert_eq!(retriever.retrieve("unobtainium widget", 3).unwrap().len(), 3);
    }

    #[test]
    fn empty_index_returns_empty() {
        let retriever = retriever(Catalog::default(), Arc::new(HashEmbedder::new(16)));
        assert!(retriever.retrieve("anything", 5).unwrap().is_empty());
    }

    #[test]
    fn zero_k_is_rejected() {
        let retriever = retriever(grocery_catalog(), Arc::new(HashEmbedder::new(16)));
        assert!(matches!(
            retriever.retrieve("milk", 0),
            Err(RetrievalError::InvalidK)
        ));
    }

    #[test]
    fn misaligned_catalog_is_rejected() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(16));
        let index = build_index(&grocery_catalog(), embedder.as_ref(), 8).unwrap();
        let smaller = Catalog::from_entries(grocery_catalog().entries()[..2].to_vec());

        let result = SemanticRetriever::new(Arc::new(smaller), Arc::new(index), embedder);
        assert!(matches!(
            result,
            Err(RetrievalError::Misaligned { catalog: 2, index: 6 })
        ));
    }

    #[test]
    fn concurrent_queries_encode_in_parallel() {
        let catalog = grocery_catalog();
        let index = build_index(&catalog, &HashEmbedder::new(32), 4).unwrap();
        let embedder = Arc::new(OverlapEmbedder {
            inner: HashEmbedder::new(32),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let retriever =
            SemanticRetriever::new(Arc::new(catalog), Arc::new(index), embedder.clone()).unwrap();

        std::thread::scope(|scope| {
            let first = scope.spawn(|| retriever.retrieve("bananas", 3));
            let second = scope.spawn(|| retriever.retrieve("sparkling water", 3));
            assert_eq!(first.join().unwrap().unwrap().len(), 3);
            assert_eq!(second.join().unwrap().unwrap().len(), 3);
        });

        assert_eq!(embedder.max_in_flight.load(Ordering::SeqCst), 2);
    }
}
