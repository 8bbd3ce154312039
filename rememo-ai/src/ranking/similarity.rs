//! Pairwise cosine similarity across a candidate pool
//!
//! Built once per request. Stored dense and row-major so a row can be read as
//! a slice when computing per-candidate diversity.

use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use super::CandidateImage;

/// Why an embedding cannot take part in cosine similarity
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingDefect {
    #[error("zero norm")]
    ZeroNorm,
    #[error("dimension {got}, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("non-finite component")]
    NonFinite,
}

/// Degenerate embedding at a specific pool position
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid embedding at index {index}: {defect}")]
pub struct InvalidEmbedding {
    pub index: usize,
    pub defect: EmbeddingDefect,
}

/// Symmetric N×N cosine similarity matrix with a unit diagonal
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Build the matrix for `embeddings` without modifying them
    ///
    /// Every embedding is validated before any similarity is computed. The
    /// expected dimension is the most common length in the pool (first seen
    /// wins ties), so a single odd-sized vector is the one reported.
    pub fn build<E: AsRef<[f32]>>(embeddings: &[E]) -> Result<Self, InvalidEmbedding> {
        let n = embeddings.len();
        let expected = reference_dimension(embeddings);

        let mut norms = Vec::with_capacity(n);
        for (index, embedding) in embeddings.iter().enumerate() {
            let embedding = embedding.as_ref();
            if embedding.len() != expected {
                return Err(InvalidEmbedding {
                    index,
                    defect: EmbeddingDefect::DimensionMismatch {
                        expected,
                        got: embedding.len(),
                    },
                });
            }
            if embedding.iter().any(|v| !v.is_finite()) {
                return Err(InvalidEmbedding {
                    index,
                    defect: EmbeddingDefect::NonFinite,
                });
            }
            let norm = embedding.iter().map(|&v| f64::from(v) * f64::from(v)).sum::<f64>().sqrt();
            if norm == 0.0 {
                return Err(InvalidEmbedding {
                    index,
                    defect: EmbeddingDefect::ZeroNorm,
                });
            }
            norms.push(norm);
        }

        if n <= 1 {
            return Ok(Self {
                n,
                values: vec![1.0; n],
            });
        }

        let mut values = vec![0.0f32; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
            let a = embeddings[i].as_ref();
            for j in (i + 1)..n {
                let b = embeddings[j].as_ref();
                let dot: f64 = a.iter().zip(b.iter()).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum();
                let sim = (dot / (norms[i] * norms[j])).clamp(-1.0, 1.0) as f32;
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        Ok(Self { n, values })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Similarity between candidates `i` and `j`
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        assert!(i < self.n && j < self.n, "similarity index out of range");
        self.values[i * self.n + j]
    }

    /// All similarities of candidate `i`, diagonal included
    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.n..(i + 1) * self.n]
    }
}

fn reference_dimension<E: AsRef<[f32]>>(embeddings: &[E]) -> usize {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    let mut best: Option<(usize, usize)> = None;
    for embedding in embeddings {
        let len = embedding.as_ref().len();
        let count = counts.entry(len).or_insert(0);
        *count += 1;
        match best {
            Some((_, best_count)) if *count <= best_count => {}
            _ => best = Some((len, *count)),
        }
    }
    best.map(|(len, _)| len).unwrap_or(0)
}

/// Drop candidates whose embeddings cannot be compared, then build the matrix
///
/// Each defect is logged and the offending candidate removed from `candidates`,
/// so the returned matrix is aligned with what remains.
pub fn screen_embeddings(candidates: &mut Vec<CandidateImage>) -> SimilarityMatrix {
    loop {
        let embeddings: Vec<&[f32]> = candidates.iter().map(|c| c.embedding.as_slice()).collect();
        match SimilarityMatrix::build(&embeddings) {
            Ok(matrix) => return matrix,
            Err(err) => {
                let dropped = candidates.remove(err.index);
                warn!(
                    photo_id = %dropped.id,
                    defect = %err.defect,
                    "Dropping candidate with unusable embedding"
                );
            }
        }
    }
}
