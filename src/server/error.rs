//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::LivecapError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Upstream translation failed; `detail` carries the upstream message
    TranslationFailed(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::TranslationFailed(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(status = %status.as_u16(), error = %msg, "Bad request");
                ErrorResponse { error: msg, detail: None }
            }
            ApiError::NotFound(msg) => {
                tracing::warn!(status = %status.as_u16(), error = %msg, "Resource not found");
                ErrorResponse { error: msg, detail: None }
            }
            ApiError::TranslationFailed(detail) => {
                tracing::error!(status = %status.as_u16(), detail = %detail, "Translation failed");
                ErrorResponse {
                    error: "Translation failed".to_string(),
                    detail: Some(detail),
                }
            }
            ApiError::Internal(msg) => {
                tracing::error!(status = %status.as_u16(), error = %msg, "Internal server error");
                ErrorResponse { error: msg, detail: None }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<LivecapError> for ApiError {
    fn from(e: LivecapError) -> Self {
        match e {
            LivecapError::InvalidInput(msg) => ApiError::BadRequest(msg),
            LivecapError::NotFound(msg) => ApiError::NotFound(msg),
            LivecapError::Translation(detail) => ApiError::TranslationFailed(detail),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
