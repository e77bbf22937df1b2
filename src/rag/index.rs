use std::cmp::Ordering;

use thiserror::Error;

use crate::catalog::Catalog;
use crate::embedding::{Embedder, EmbeddingError};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error("embedder returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
    #[error("vector {row} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Flat exact nearest-neighbour index using squared Euclidean distance.
///
/// Row `i` holds the vector of catalog entry `i`. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn from_vectors(dimension: usize, vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let mut index = Self::new(dimension);
        index.data.reserve(dimension * vectors.len());
        for (row, vector) in vectors.into_iter().enumerate() {
            index.push(row, &vector)?;
        }
        Ok(index)
    }

    fn push(&mut self, row: usize, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                row,
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns up to `k` `(row, distance)` pairs, nearest first.
    ///
    /// Equal distances are ordered by row so results are reproducible.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                row: 0,
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, vector)| (row, squared_l2(query, vector)))
            .collect();

        let k = k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, compare_hits);
            scored.truncate(k);
        }
        scored.sort_by(compare_hits);
        Ok(scored)
    }
}

fn compare_hits(left: &(usize, f32), right: &(usize, f32)) -> Ordering {
    left.1
        .partial_cmp(&right.1)
        .unwrap_or(Ordering::Equal)
        .then(left.0.cmp(&right.0))
}

fn squared_l2(left: &[f32], right: &[f32]) -> f32 {
    left.iter()
        .zip(right)
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff
        })
        .sum()
}

/// Embeds every catalog entry in row order and builds the index.
pub fn build_index(
    catalog: &Catalog,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<VectorIndex, IndexError> {
    let dimension = embedder.dimension();
    let texts = catalog.embedding_texts();
    let mut index = VectorIndex::new(dimension);
    index.data.reserve(dimension * texts.len());

    let batch_size = batch_size.max(1);
    let started = std::time::Instant::now();

    for (batch_no, batch) in texts.chunks(batch_size).enumerate() {
        let vectors = embedder.embed(batch)?;
        if vectors.len() != batch.len() {
            return Err(IndexError::CountMismatch {
                expected: batch.len(),
                actual: vectors.len(),
            });
        }
        let offset = batch_no * batch_size;
        for (i, vector) in vectors.iter().enumerate() {
            index.push(offset + i, vector)?;
        }
    }

    tracing::info!(
        "Vector index built: {} rows, dim={}, embedder={}, {} ms",
        index.len(),
        dimension,
        embedder.id(),
        started.elapsed().as_millis()
    );

    Ok(index)
}
