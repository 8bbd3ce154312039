//! Greedy redundancy-penalized selection
//!
//! Every candidate is charged a penalty proportional to its summed similarity
//! with the candidates picked before it:
//!
//! ```text
//! penalty(c)        = penalty_weight * Σ sim(c, s)   for s already picked
//! adjusted_score(c) = aesthetic(c) - penalty(c)
//! ```
//!
//! The two strategies differ only in who gets picked next. The result is
//! always reported by adjusted score, highest first.

use std::cmp::Ordering;

use rememo_common::config::SelectionStrategyKind;
use serde::Serialize;

use super::similarity::SimilarityMatrix;

/// A visited candidate with its score breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    /// Position in the candidate pool
    pub index: usize,
    pub composite: f32,
    pub original_aesthetic: f32,
    pub penalty: f32,
    pub adjusted_score: f32,
}

/// Everything a strategy reads, all aligned with the candidate pool
#[derive(Debug, Clone, Copy)]
pub struct SelectionInput<'a> {
    pub aesthetic: &'a [f32],
    pub composite: &'a [f32],
    pub similarity: &'a SimilarityMatrix,
}

impl SelectionInput<'_> {
    fn len(&self) -> usize {
        self.aesthetic.len()
    }

    fn visit(&self, index: usize, penalty: f32) -> RankedCandidate {
        RankedCandidate {
            index,
            composite: self.composite[index],
            original_aesthetic: self.aesthetic[index],
            penalty,
            adjusted_score: self.aesthetic[index] - penalty,
        }
    }
}

/// Picks up to `k` candidates, ordered by adjusted score descending
pub trait SelectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn select(&self, input: &SelectionInput<'_>, k: usize) -> Vec<RankedCandidate>;
}

/// Candidate indices by composite score descending, ties in pool order
pub fn visiting_order(composite: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..composite.len()).collect();
    order.sort_by(|&a, &b| composite[b].total_cmp(&composite[a]));
    order
}

fn by_adjusted_desc(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.adjusted_score.total_cmp(&a.adjusted_score)
}

fn summed_similarity(similarity: &SimilarityMatrix, candidate: usize, picked: &[usize]) -> f32 {
    let row = similarity.row(candidate);
    picked.iter().map(|&s| row[s]).sum()
}

/// Fixed visiting order
///
/// The order is settled once by composite score. Each candidate is charged
/// against every candidate visited before it, and a penalty never moves a
/// candidate within the visiting order. All candidates are visited before the
/// list is sorted by adjusted score and cut to `k`.
#[derive(Debug, Clone, Copy)]
pub struct FrozenOrderSelector {
    pub penalty_weight: f32,
}

impl SelectionStrategy for FrozenOrderSelector {
    fn name(&self) -> &'static str {
        "frozen_order"
    }

    fn select(&self, input: &SelectionInput<'_>, k: usize) -> Vec<RankedCandidate> {
        let order = visiting_order(input.composite);
        let mut visited: Vec<usize> = Vec::with_capacity(order.len());
        let mut ranked = Vec::with_capacity(order.len());

        for &index in &order {
            let penalty = self.penalty_weight * summed_similarity(input.similarity, index, &visited);
            ranked.push(input.visit(index, penalty));
            visited.push(index);
        }

        ranked.sort_by(by_adjusted_desc);
        ranked.truncate(k);
        ranked
    }
}

/// Re-pick after every selection
///
/// Each step takes the remaining candidate with the best adjusted score given
/// everything picked so far. Ties go to the earlier candidate in visiting
/// order.
#[derive(Debug, Clone, Copy)]
pub struct MarginalRelevanceSelector {
    pub penalty_weight: f32,
}

impl SelectionStrategy for MarginalRelevanceSelector {
    fn name(&self) -> &'static str {
        "marginal_relevance"
    }

    fn select(&self, input: &SelectionInput<'_>, k: usize) -> Vec<RankedCandidate> {
        let mut remaining = visiting_order(input.composite);
        let mut picked: Vec<usize> = Vec::with_capacity(k.min(input.len()));
        let mut ranked = Vec::with_capacity(k.min(input.len()));

        while picked.len() < k && !remaining.is_empty() {
            let mut best: Option<(usize, RankedCandidate)> = None;
            for (pos, &index) in remaining.iter().enumerate() {
                let penalty = self.penalty_weight * summed_similarity(input.similarity, index, &picked);
                let candidate = input.visit(index, penalty);
                let better = match &best {
                    Some((_, current)) => candidate.adjusted_score > current.adjusted_score,
                    None => true,
                };
                if better {
                    best = Some((pos, candidate));
                }
            }

            let Some((pos, candidate)) = best else { break };
            remaining.remove(pos);
            picked.push(candidate.index);
            ranked.push(candidate);
        }

        ranked.sort_by(by_adjusted_desc);
        ranked
    }
}

/// Build the configured strategy
pub fn strategy_for(kind: SelectionStrategyKind, penalty_weight: f32) -> Box<dyn SelectionStrategy> {
    match kind {
        SelectionStrategyKind::FrozenOrder => Box::new(FrozenOrderSelector { penalty_weight }),
        SelectionStrategyKind::MarginalRelevance => Box::new(MarginalRelevanceSelector { penalty_weight }),
    }
}
