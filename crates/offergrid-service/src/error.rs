//! API error types and their wire shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use offergrid_core::LookupError;

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Stable error code identifier.
    pub error_code: String,
    /// Human readable message.
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Client-facing error for the offer endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String },
    #[error("{message}")]
    TooManyRequests { message: String },
}

impl ApiError {
    fn to_status_and_payload(&self) -> (StatusCode, ApiErrorResponse) {
        let (status, error_code) = match self {
            Self::BadRequest { .. } => (StatusCode::BAD_REQUEST, "INVALID_SKU"),
            Self::TooManyRequests { .. } => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        };
        (
            status,
            ApiErrorResponse {
                error: ApiErrorDetail {
                    error_code: error_code.to_string(),
                    message: self.to_string(),
                },
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, payload) = self.to_status_and_payload();
        (status, Json(payload)).into_response()
    }
}

impl From<LookupError> for ApiError {
    fn from(error: LookupError) -> Self {
        match error {
            LookupError::InvalidSku(source) => Self::BadRequest {
                message: source.to_string(),
            },
            LookupError::RateLimited { caller } => Self::TooManyRequests {
                message: format!("rate limit exceeded for caller '{caller}'"),
            },
        }
    }
}
