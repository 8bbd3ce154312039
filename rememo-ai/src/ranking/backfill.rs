//! Fixed-size result for the collage-vote path

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::models::PhotoId;

/// Merge judge picks with references and fill up to `target` at random
///
/// - judge picks come first, then every reference, first occurrence wins
/// - if that overshoots, judge picks are dropped from the end so references
///   survive (references alone beyond `target` are cut in order)
/// - if it undershoots, unused `pool` identifiers are drawn uniformly without
///   replacement until `target` is reached or the pool runs dry
pub fn backfill<R: Rng + ?Sized>(
    judged: &[PhotoId],
    references: &[PhotoId],
    pool: &[PhotoId],
    target: usize,
    rng: &mut R,
) -> Vec<PhotoId> {
    let reference_set: HashSet<&PhotoId> = references.iter().collect();
    let mut seen: HashSet<&PhotoId> = HashSet::new();
    let mut selected: Vec<&PhotoId> = judged
        .iter()
        .chain(references.iter())
        .filter(|id| seen.insert(*id))
        .collect();

    let mut cursor = selected.len();
    while selected.len() > target && cursor > 0 {
        cursor -= 1;
        if !reference_set.contains(selected[cursor]) {
            selected.remove(cursor);
        }
    }

    if selected.len() < target {
        let remaining: Vec<&PhotoId> = pool.iter().filter(|id| seen.insert(*id)).collect();
        let needed = target - selected.len();
        debug!(
            needed,
            available = remaining.len(),
            "Backfilling recommendation with random picks"
        );
        selected.extend(remaining.choose_multiple(rng, needed).copied());
    }

    selected.truncate(target);
    selected.into_iter().cloned().collect()
}
