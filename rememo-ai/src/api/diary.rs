//! Diary endpoints
//!
//! POST /generate writes a new diary from photos; POST /modify revises one.

use axum::{extract::State, routing::post, Json, Router};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{DiaryModifyRequest, DiaryRequest, DiaryResponse};
use crate::AppState;

/// POST /generate
pub async fn generate_diary(
    State(state): State<AppState>,
    Json(request): Json<DiaryRequest>,
) -> ApiResult<Json<DiaryResponse>> {
    if request.image_info.is_empty() {
        return Err(ApiError::BadRequest("image_info must contain at least one photo".to_string()));
    }
    for (i, photo) in request.image_info.iter().enumerate() {
        super::scoring::validate_url(&photo.photo_url)
            .map_err(|reason| ApiError::BadRequest(format!("image_info[{}].photoUrl {}", i, reason)))?;
    }

    let span = info_span!("generate", request_id = %Uuid::new_v4(), photos = request.image_info.len());
    let response = state.diary_writer.generate(&request).instrument(span).await?;
    Ok(Json(response))
}

/// POST /modify
pub async fn modify_diary(
    State(state): State<AppState>,
    Json(request): Json<DiaryModifyRequest>,
) -> ApiResult<Json<DiaryResponse>> {
    if request.diary.trim().is_empty() {
        return Err(ApiError::BadRequest("diary must not be empty".to_string()));
    }

    let span = info_span!("modify", request_id = %Uuid::new_v4());
    let response = state.diary_writer.modify(&request).instrument(span).await?;
    Ok(Json(response))
}

/// Build diary routes
pub fn diary_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_diary))
        .route("/modify", post(modify_diary))
}
