//! Photo recommendation endpoints
//!
//! - POST /score: collage vote, exactly `collage_top_n` ids when possible
//! - POST /score_clip: local aesthetic ranking, at most `aesthetic_top_n` ids
//!
//! Ranking never fails a request. Only a total download or provider outage
//! answers 502, still carrying an empty `recommendedPhotoIds`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{ImageScoringRequest, ImageScoringResponse, PhotoInput, ScoreQuery};
use crate::services::ScoringError;
use crate::AppState;

/// Check that a photo location is an absolute http(s) URL
pub fn validate_url(raw: &str) -> Result<(), &'static str> {
    match reqwest::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(_) => Err("must use http or https"),
        Err(_) => Err("is not a valid URL"),
    }
}

fn validate_photos(photos: &[PhotoInput], field: &str) -> ApiResult<()> {
    for (i, photo) in photos.iter().enumerate() {
        validate_url(&photo.photo_url)
            .map_err(|reason| ApiError::BadRequest(format!("{}[{}].photoUrl {}", field, i, reason)))?;
    }
    Ok(())
}

fn validate_request(request: &ImageScoringRequest) -> ApiResult<()> {
    validate_photos(&request.images, "images")?;
    validate_photos(&request.reference_images, "reference_images")
}

/// 502 with an empty recommendation
fn scoring_failure(err: ScoringError) -> Response {
    warn!(error = %err, "Scoring request failed");
    let api_error = ApiError::Upstream {
        code: "SCORING_UNAVAILABLE".to_string(),
        message: err.to_string(),
    };
    let body = json!({
        "recommendedPhotoIds": [],
        "error": api_error.body(),
    });
    (StatusCode::BAD_GATEWAY, Json(body)).into_response()
}

/// POST /score
pub async fn score_collage(
    State(state): State<AppState>,
    Json(request): Json<ImageScoringRequest>,
) -> ApiResult<Response> {
    validate_request(&request)?;
    if request.images.is_empty() {
        return Ok(Json(ImageScoringResponse::default()).into_response());
    }

    let span = info_span!(
        "score",
        request_id = %Uuid::new_v4(),
        images = request.images.len(),
        references = request.reference_images.len()
    );
    let judged = state
        .collage_voter
        .judge(&request.images, &request.reference_images)
        .instrument(span)
        .await;

    let pool = match judged {
        Ok(pool) => pool,
        Err(err) => return Ok(scoring_failure(err)),
    };

    let ids = {
        let mut rng = rand::thread_rng();
        pool.finalize(state.collage_voter.target(), &mut rng)
    };
    Ok(Json(ImageScoringResponse::ids(ids)).into_response())
}

/// POST /score_clip
pub async fn score_aesthetic(
    State(state): State<AppState>,
    Query(query): Query<ScoreQuery>,
    Json(request): Json<ImageScoringRequest>,
) -> ApiResult<Response> {
    validate_request(&request)?;
    if request.images.is_empty() {
        return Ok(Json(ImageScoringResponse::default()).into_response());
    }

    let span = info_span!(
        "score_clip",
        request_id = %Uuid::new_v4(),
        images = request.images.len()
    );
    let ranked = state
        .aesthetic_ranker
        .rank(&request.images)
        .instrument(span)
        .await;

    let result = match ranked {
        Ok(result) => result,
        Err(err) => return Ok(scoring_failure(err)),
    };

    let response = ImageScoringResponse {
        recommended_photo_ids: result.ids(),
        ranking: query.explain.then_some(result.ranked),
    };
    Ok(Json(response).into_response())
}

/// Build scoring routes
pub fn scoring_routes() -> Router<AppState> {
    Router::new()
        .route("/score", post(score_collage))
        .route("/score_clip", post(score_aesthetic))
}
