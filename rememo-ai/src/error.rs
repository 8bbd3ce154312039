//! Error types for rememo-ai

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::services::DiaryError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// An upstream model or photo host failed (502)
    #[error("Upstream failure {code}: {message}")]
    Upstream { code: String, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Upstream { code, .. } => code,
        }
    }

    /// `{"code": ..., "message": ...}`
    pub fn body(&self) -> Value {
        let message = match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Upstream { message, .. } => message.clone(),
        };
        json!({
            "code": self.code(),
            "message": message,
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.body() }));
        (self.status(), body).into_response()
    }
}

impl From<DiaryError> for ApiError {
    fn from(err: DiaryError) -> Self {
        match err {
            DiaryError::PhotoUnavailable { .. } => ApiError::Upstream {
                code: "PHOTO_UNAVAILABLE".to_string(),
                message: err.to_string(),
            },
            DiaryError::Model(model_err) => ApiError::Upstream {
                code: model_err.code(),
                message: model_err.to_string(),
            },
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
