//! Parsing the collage judge's free-text answer

use thiserror::Error;

use crate::models::PhotoId;

/// Longest excerpt of a bad answer kept for logging
const EXCERPT_CHARS: usize = 120;

/// The judge's answer held no usable position numbers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("judge output has no usable positions: {excerpt:?}")]
pub struct MalformedJudgeOutput {
    pub excerpt: String,
}

/// Parse a comma-separated list of collage positions
///
/// Tokens are trimmed; anything that is not purely ASCII digits is skipped.
/// Order and repeats are kept as written.
pub fn parse_judge_output(output: &str) -> Result<Vec<usize>, MalformedJudgeOutput> {
    let positions: Vec<usize> = output
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|token| token.parse().ok())
        .collect();

    if positions.is_empty() {
        return Err(MalformedJudgeOutput {
            excerpt: output.chars().take(EXCERPT_CHARS).collect(),
        });
    }

    Ok(positions)
}

/// 1-based collage position → photo identifier, fixed before the judge runs
#[derive(Debug, Clone, Default)]
pub struct PositionTable {
    ids: Vec<PhotoId>,
}

impl PositionTable {
    pub fn new(ids: Vec<PhotoId>) -> Self {
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&PhotoId> {
        position.checked_sub(1).and_then(|i| self.ids.get(i))
    }

    /// Map positions to identifiers, dropping positions outside the table
    pub fn resolve(&self, positions: &[usize]) -> Vec<PhotoId> {
        positions.iter().filter_map(|&p| self.get(p).cloned()).collect()
    }

    /// All identifiers in position order
    pub fn ids(&self) -> &[PhotoId] {
        &self.ids
    }
}
