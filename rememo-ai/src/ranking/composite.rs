//! Aesthetic + diversity composite scoring

use super::similarity::SimilarityMatrix;

/// Ranges at or below this are treated as constant vectors
const FLAT_RANGE: f64 = 1e-9;

/// Min-max normalize into [0, 1]
///
/// A constant vector maps every entry to the midpoint 0.5. Arithmetic runs in
/// f64 so the spread of any two finite f32 values stays finite.
pub fn min_max_normalize(values: &[f32]) -> Vec<f32> {
    let Some(min) = values.iter().map(|&v| f64::from(v)).reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().map(|&v| f64::from(v)).fold(min, f64::max);
    let range = max - min;

    if range <= FLAT_RANGE {
        return vec![0.5; values.len()];
    }

    values
        .iter()
        .map(|&v| ((f64::from(v) - min) / range).clamp(0.0, 1.0) as f32)
        .collect()
}

/// Distinctiveness of each candidate from the rest of the pool
///
/// `1 - mean similarity to every other candidate`. Empty for N ≤ 1, where
/// there are no peers to differ from.
pub fn diversity_scores(matrix: &SimilarityMatrix) -> Vec<f32> {
    let n = matrix.len();
    if n <= 1 {
        return Vec::new();
    }

    (0..n)
        .map(|i| {
            let others: f32 = matrix.row(i).iter().sum::<f32>() - matrix.get(i, i);
            1.0 - others / (n - 1) as f32
        })
        .collect()
}

/// Blend normalized aesthetic quality with normalized diversity
///
/// `aesthetic_weight` goes to aesthetics and the remainder to diversity. A
/// single candidate has no diversity signal and scores its normalized
/// aesthetic value alone.
pub fn composite_scores(aesthetic: &[f32], matrix: &SimilarityMatrix, aesthetic_weight: f32) -> Vec<f32> {
    debug_assert_eq!(aesthetic.len(), matrix.len());

    let aesthetic_norm = min_max_normalize(aesthetic);
    if aesthetic.len() <= 1 {
        return aesthetic_norm;
    }

    let diversity_norm = min_max_normalize(&diversity_scores(matrix));
    let diversity_weight = 1.0 - aesthetic_weight;

    aesthetic_norm
        .iter()
        .zip(diversity_norm.iter())
        .map(|(a, d)| aesthetic_weight * a + diversity_weight * d)
        .collect()
}
