//! Aesthetic-diversity ranking
//!
//! Pure, synchronous computation over one request's candidate pool:
//!
//! 1. [`similarity`] - pairwise cosine similarity matrix
//! 2. [`composite`] - normalized aesthetic + diversity blend
//! 3. [`selector`] - greedy redundancy-penalized selection
//! 4. [`assembler`] - back to caller identifiers, capped and de-duplicated
//!
//! The collage-vote path uses [`judge`] and [`backfill`] instead of 1-3.
//!
//! Nothing here keeps state between calls.

pub mod assembler;
pub mod backfill;
pub mod composite;
pub mod judge;
pub mod selector;
pub mod similarity;

pub use assembler::{assemble, RankedPhoto, SelectionResult};
pub use backfill::backfill;
pub use composite::{composite_scores, diversity_scores, min_max_normalize};
pub use judge::{parse_judge_output, MalformedJudgeOutput, PositionTable};
pub use selector::{
    strategy_for, FrozenOrderSelector, MarginalRelevanceSelector, RankedCandidate, SelectionInput,
    SelectionStrategy,
};
pub use similarity::{screen_embeddings, EmbeddingDefect, InvalidEmbedding, SimilarityMatrix};

use rememo_common::config::SelectionConfig;
use tracing::{debug, warn};

use crate::models::PhotoId;

/// A fetched and evaluated photo
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateImage {
    pub id: PhotoId,
    pub photo_url: String,
    /// Fixed-length feature vector, L2-normalized by the provider client
    pub embedding: Vec<f32>,
    pub aesthetic: f32,
}

/// Rank the pool and keep the top `aesthetic_top_n`
///
/// Candidates with a non-finite aesthetic score or an unusable embedding are
/// dropped. An empty or fully degenerate pool gives an empty result.
pub fn rank_candidates(
    mut candidates: Vec<CandidateImage>,
    config: &SelectionConfig,
    strategy: &dyn SelectionStrategy,
) -> SelectionResult {
    candidates.retain(|c| {
        let usable = c.aesthetic.is_finite();
        if !usable {
            warn!(photo_id = %c.id, "Dropping candidate with non-finite aesthetic score");
        }
        usable
    });

    let similarity = screen_embeddings(&mut candidates);
    if candidates.is_empty() {
        return SelectionResult::default();
    }

    let aesthetic: Vec<f32> = candidates.iter().map(|c| c.aesthetic).collect();
    let composite = composite_scores(&aesthetic, &similarity, config.aesthetic_weight);
    let input = SelectionInput {
        aesthetic: &aesthetic,
        composite: &composite,
        similarity: &similarity,
    };

    // Rank the whole pool so identifier de-duplication can't under-fill the cap
    let ranked = strategy.select(&input, candidates.len());
    let result = assemble(&candidates, &ranked, config.aesthetic_top_n);

    debug!(
        strategy = strategy.name(),
        pool_size = candidates.len(),
        selected = result.len(),
        "Ranked candidate pool"
    );
    result
}
