//! HTTP error responses
//!
//! Every handler error is an `AppError`; this module decides the status code
//! and the `{"error": {"code", "message"}}` body.

use crate::error::AppError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Handler error wrapper around `AppError`
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError(AppError::InvalidInput(message.into()))
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError(AppError::NotFound(what.into()))
    }

    /// Status code and stable error code for an application error
    pub fn classify(err: &AppError) -> (StatusCode, &'static str) {
        match err {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::NoContent => (StatusCode::BAD_REQUEST, "NO_CONTENT"),
            AppError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Transcription(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "TRANSCRIPTION_FAILED")
            }
            AppError::Generation(_) => (StatusCode::INTERNAL_SERVER_ERROR, "GENERATION_FAILED"),
            AppError::Database(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Config(_)
            | AppError::Other(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = Self::classify(&self.0);

        // Adapter failures carry a useful message; other internals stay private.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR && !self.0.is_adapter_error()
        {
            log::error!("Request failed: {}", self.0);
            "An internal error occurred".to_string()
        } else {
            self.0.to_string()
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
