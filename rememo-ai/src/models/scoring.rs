//! Photo recommendation request/response types

use serde::{Deserialize, Serialize};

use super::photo::{PhotoId, PhotoInput};
use crate::ranking::RankedPhoto;

/// POST /score and POST /score_clip body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageScoringRequest {
    pub images: Vec<PhotoInput>,
    #[serde(default)]
    pub reference_images: Vec<PhotoInput>,
}

/// Recommended identifiers, most-recommended first
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImageScoringResponse {
    #[serde(rename = "recommendedPhotoIds")]
    pub recommended_photo_ids: Vec<PhotoId>,
    /// Per-photo score breakdown, only with `?explain=true`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking: Option<Vec<RankedPhoto>>,
}

impl ImageScoringResponse {
    pub fn ids(recommended_photo_ids: Vec<PhotoId>) -> Self {
        Self {
            recommended_photo_ids,
            ranking: None,
        }
    }
}

/// Query string for the aesthetic path
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ScoreQuery {
    #[serde(default)]
    pub explain: bool,
}
