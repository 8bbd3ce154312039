//! Collage-vote path: a multimodal judge picks from numbered collages
//!
//! The result always has `collage_top_n` identifiers when enough photos are
//! available. Judge picks come first, then every reference, then random
//! backfill from the unused candidates.

use std::collections::HashSet;
use std::sync::Arc;

use image::RgbImage;
use rand::Rng;
use rememo_common::config::SelectionConfig;
use tracing::{debug, info, warn};

use super::imaging::{compose_collages, decode_all, png_data_url};
use super::openai_client::{ContentPart, MultimodalModel};
use super::photo_fetcher::{fetch_all, successful, PhotoFetcher};
use super::prompts::collage_selection_prompt;
use super::ScoringError;
use crate::models::{PhotoId, PhotoInput};
use crate::ranking::{backfill, parse_judge_output, PositionTable};

/// Judge picks plus everything backfill needs, before randomness is applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JudgedPool {
    /// Judge picks in the order the judge gave them
    pub judged: Vec<PhotoId>,
    /// Every requested reference identifier
    pub references: Vec<PhotoId>,
    /// Candidates that were loaded and shown to the judge, in position order
    pub pool: Vec<PhotoId>,
}

impl JudgedPool {
    /// Produce exactly `target` identifiers when the pool allows it
    pub fn finalize<R: Rng + ?Sized>(&self, target: usize, rng: &mut R) -> Vec<PhotoId> {
        backfill(&self.judged, &self.references, &self.pool, target, rng)
    }
}

/// Runs the collage judge for one request
pub struct CollageVoter {
    fetcher: Arc<dyn PhotoFetcher>,
    judge: Arc<dyn MultimodalModel>,
    model: String,
    selection: SelectionConfig,
    max_concurrency: usize,
}

impl CollageVoter {
    pub fn new(
        fetcher: Arc<dyn PhotoFetcher>,
        judge: Arc<dyn MultimodalModel>,
        model: impl Into<String>,
        selection: SelectionConfig,
        max_concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            judge,
            model: model.into(),
            selection,
            max_concurrency,
        }
    }

    pub fn target(&self) -> usize {
        self.selection.collage_top_n
    }

    /// Load photos, ask the judge and map its answer back to identifiers
    ///
    /// A failed or unparseable judge answer yields no picks; backfill covers
    /// it. Only a request whose candidates all fail to load is an error.
    pub async fn judge(&self, images: &[PhotoInput], references: &[PhotoInput]) -> Result<JudgedPool, ScoringError> {
        let mut seen = HashSet::new();
        let reference_ids: Vec<PhotoId> = references
            .iter()
            .map(|r| r.id.clone())
            .filter(|id| seen.insert(id.clone()))
            .collect();

        if images.is_empty() {
            return Ok(JudgedPool {
                references: reference_ids,
                ..JudgedPool::default()
            });
        }

        let (candidate_outcomes, reference_outcomes) = tokio::join!(
            fetch_all(self.fetcher.as_ref(), images, self.max_concurrency),
            fetch_all(self.fetcher.as_ref(), references, self.max_concurrency),
        );
        let (candidates, reference_images) = tokio::join!(
            decode_all(successful(candidate_outcomes)),
            decode_all(successful(reference_outcomes)),
        );

        if candidates.is_empty() {
            return Err(ScoringError::Unavailable(format!(
                "none of the {} photos could be loaded",
                images.len()
            )));
        }

        let table = PositionTable::new(candidates.iter().map(|(photo, _)| photo.id.clone()).collect());
        let top_k = self.selection.collage_top_n.saturating_sub(reference_ids.len());

        let judged = if top_k == 0 {
            debug!("References fill the result; skipping judge");
            Vec::new()
        } else {
            let candidate_pixels: Vec<RgbImage> = candidates.into_iter().map(|(_, img)| img).collect();
            let reference_pixels: Vec<RgbImage> = reference_images.into_iter().map(|(_, img)| img).collect();
            self.ask_judge(&table, candidate_pixels, reference_pixels, top_k).await
        };

        info!(
            candidates = table.len(),
            references = reference_ids.len(),
            judged = judged.len(),
            "Collage vote complete"
        );

        Ok(JudgedPool {
            judged,
            references: reference_ids,
            pool: table.ids().to_vec(),
        })
    }

    async fn ask_judge(
        &self,
        table: &PositionTable,
        candidates: Vec<RgbImage>,
        references: Vec<RgbImage>,
        top_k: usize,
    ) -> Vec<PhotoId> {
        let num_reference = references.len();
        let grid = self.selection.collage_grid;
        let reference_grid = self.selection.reference_grid;
        let thumb_size = self.selection.thumb_size;

        let encoded = tokio::task::spawn_blocking(move || {
            let mut urls = Vec::new();
            if !references.is_empty() {
                for collage in compose_collages(&references, reference_grid, thumb_size) {
                    urls.push(png_data_url(&collage)?);
                }
            }
            for collage in compose_collages(&candidates, grid, thumb_size) {
                urls.push(png_data_url(&collage)?);
            }
            Ok::<_, image::ImageError>(urls)
        })
        .await;

        let collage_urls = match encoded {
            Ok(Ok(urls)) => urls,
            Ok(Err(e)) => {
                warn!(error = %e, "Collage encoding failed; falling back to backfill");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Collage task failed; falling back to backfill");
                return Vec::new();
            }
        };

        let mut content = vec![ContentPart::text(collage_selection_prompt(num_reference, top_k))];
        content.extend(collage_urls.into_iter().map(ContentPart::image));

        let answer = match self.judge.respond(&self.model, content).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, code = %e.code(), "Collage judge failed; falling back to backfill");
                return Vec::new();
            }
        };

        match parse_judge_output(&answer) {
            Ok(positions) => {
                let judged = table.resolve(&positions);
                debug!(?positions, resolved = judged.len(), "Parsed judge answer");
                judged
            }
            Err(e) => {
                warn!(error = %e, "Falling back to backfill");
                Vec::new()
            }
        }
    }
}
