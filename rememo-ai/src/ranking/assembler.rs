//! Map ranked pool positions back to caller identifiers

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::selector::RankedCandidate;
use super::CandidateImage;
use crate::models::PhotoId;

/// One recommended photo with its score breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPhoto {
    pub id: PhotoId,
    #[serde(rename = "photoUrl")]
    pub photo_url: String,
    pub adjusted_score: f32,
    pub original_aesthetic_score: f32,
    pub penalty_applied: f32,
}

/// Final recommendation, most-recommended first, no repeated identifiers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionResult {
    pub ranked: Vec<RankedPhoto>,
}

impl SelectionResult {
    pub fn ids(&self) -> Vec<PhotoId> {
        self.ranked.iter().map(|r| r.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Resolve `ranked` against the pool, keep the first occurrence of each
/// identifier and cut to `cap`
///
/// Callers may send the same identifier twice; only its best-ranked entry is
/// reported.
pub fn assemble(candidates: &[CandidateImage], ranked: &[RankedCandidate], cap: usize) -> SelectionResult {
    let mut seen: HashSet<&PhotoId> = HashSet::with_capacity(ranked.len());
    let ranked = ranked
        .iter()
        .filter_map(|r| candidates.get(r.index).map(|c| (r, c)))
        .filter(|(_, c)| seen.insert(&c.id))
        .take(cap)
        .map(|(r, c)| RankedPhoto {
            id: c.id.clone(),
            photo_url: c.photo_url.clone(),
            adjusted_score: r.adjusted_score,
            original_aesthetic_score: r.original_aesthetic,
            penalty_applied: r.penalty,
        })
        .collect();

    SelectionResult { ranked }
}
