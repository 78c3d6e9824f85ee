//! API error handling
//!
//! Error bodies carry only a fixed, user-facing `detail`; causes are
//! logged server-side and never serialized.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mzp_core::ChatbotError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Detail returned when the pipeline was never initialized
pub const UNAVAILABLE_DETAIL: &str = "AI system is temporarily unavailable. Please try again later.";

/// Detail returned for any processing failure
pub const INTERNAL_DETAIL: &str = "An error occurred while processing your request.";

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable message
    #[schema(example = "An error occurred while processing your request.")]
    pub detail: String,
}

impl ApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn unavailable() -> Self {
        Self::new(UNAVAILABLE_DETAIL)
    }

    pub fn internal_error() -> Self {
        Self::new(INTERNAL_DETAIL)
    }
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("retrieval pipeline is not initialized")]
    ServiceUnavailable,

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, ApiError::unavailable())
            }
            AppError::Internal(cause) => {
                tracing::error!(cause = %cause, "Query processing error");
                (StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal_error())
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<ChatbotError> for AppError {
    fn from(err: ChatbotError) -> Self {
        AppError::Internal(err.to_string())
    }
}
