//! Per-document in-memory vector index
//!
//! Exact cosine search over an `ndarray` matrix of L2-normalised chunk
//! embeddings. Built for one analysis and dropped afterwards.

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{Error, Result};
use crate::types::Chunk;

/// Search result with chunk and similarity
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0..=1.0, higher is better)
    pub score: f32,
}

/// Exact nearest-neighbour index over chunk embeddings
#[derive(Debug)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    /// One normalised row per chunk
    matrix: Array2<f32>,
}

impl VectorIndex {
    /// Build an index pairing `chunks[i]` with `embeddings[i]`
    pub fn build(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(Error::vector_index(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        if !chunks.is_empty() && dimensions == 0 {
            return Err(Error::vector_index("embeddings must not be empty"));
        }

        let mut flat = Vec::with_capacity(chunks.len() * dimensions);
        for (i, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != dimensions {
                return Err(Error::vector_index(format!(
                    "embedding {} has {} dimensions, expected {}",
                    i,
                    embedding.len(),
                    dimensions
                )));
            }
            flat.extend(normalized(ArrayView1::from(embedding.as_slice())).iter());
        }

        let matrix = Array2::from_shape_vec((chunks.len(), dimensions), flat)
            .map_err(|e| Error::vector_index(e.to_string()))?;

        Ok(Self { chunks, matrix })
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding dimensions (0 for an empty index)
    pub fn dimensions(&self) -> usize {
        self.matrix.ncols()
    }

    /// Up to `k` chunks most similar to `query`, best first.
    /// Equal scores keep document order.
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimensions() {
            return Err(Error::vector_index(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions()
            )));
        }

        let query = normalized(ArrayView1::from(query));
        let scores = self.matrix.dot(&query);

        let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }
}

/// L2-normalised copy; zero vectors stay zero and score 0 against anything
fn normalized(v: ArrayView1<f32>) -> Array1<f32> {
    let norm = v.dot(&v).sqrt();
    if norm > f32::EPSILON {
        v.mapv(|x| x / norm)
    } else {
        Array1::zeros(v.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk(index: usize, content: &str) -> Chunk {
        Chunk {
            index,
            content: content.to_string(),
            char_start: index * 10,
            char_end: index * 10 + content.chars().count(),
        }
    }

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n).map(|i| chunk(i, &format!("chunk {}", i))).collect()
    }

    #[test]
    fn test_query_ranks_by_cosine() {
        let index = VectorIndex::build(
            chunks(3),
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
        )
        .unwrap();

        let results = index.query(&[1.0, 0.1], 3).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.chunk.index).collect();
        assert_eq!(order, vec![0, 2, 1]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_magnitude_does_not_affect_ranking() {
        let index = VectorIndex::build(chunks(2), vec![vec![100.0, 0.0], vec![0.1, 0.1]]).unwrap();

        let results = index.query(&[1.0, 1.0], 1).unwrap();
        assert_eq!(results[0].chunk.index, 1);
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ties_keep_document_order() {
        let index = VectorIndex::build(chunks(4), vec![vec![1.0, 0.0]; 4]).unwrap();

        let results = index.query(&[1.0, 0.0], 4).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.chunk.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_k_larger_than_index_returns_all() {
        let index = VectorIndex::build(chunks(2), vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(index.query(&[1.0, 0.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_index_and_zero_k_return_nothing() {
        let empty = VectorIndex::build(Vec::new(), Vec::new()).unwrap();
        assert!(empty.is_empty());
        assert!(empty.query(&[1.0, 0.0, 0.0], 4).unwrap().is_empty());

        let index = VectorIndex::build(chunks(1), vec![vec![1.0]]).unwrap();
        assert!(index.query(&[1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let index = VectorIndex::build(chunks(1), vec![vec![1.0, 0.0]]).unwrap();
        assert!(matches!(index.query(&[1.0, 0.0, 0.0], 1), Err(Error::VectorIndex(_))));

        let ragged = VectorIndex::build(chunks(2), vec![vec![1.0, 0.0], vec![1.0]]);
        assert!(matches!(ragged, Err(Error::VectorIndex(_))));

        let unpaired = VectorIndex::build(chunks(2), vec![vec![1.0]]);
        assert!(matches!(unpaired, Err(Error::VectorIndex(_))));
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let index = VectorIndex::build(chunks(2), vec![vec![0.0, 0.0], vec![1.0, 0.0]]).unwrap();
        let results = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].chunk.index, 1);
        assert_eq!(results[1].score, 0.0);
    }

    proptest! {
        #[test]
        fn prop_results_sorted_and_bounded(
            rows in prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 3), 0..20),
            query in prop::collection::vec(-10.0f32..10.0, 3),
            k in 0usize..25,
        ) {
            let n = rows.len();
            let index = VectorIndex::build(chunks(n), rows).unwrap();
            let results = index.query(&query, k).unwrap();

            prop_assert_eq!(results.len(), k.min(n));
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pair[0].chunk.index < pair[1].chunk.index);
                }
            }
            for r in &results {
                prop_assert!(r.score <= 1.0 + 1e-4 && r.score >= -1.0 - 1e-4);
            }
        }
    }
}
