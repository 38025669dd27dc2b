//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::diagnosis::DiagnosisError;

/// User-facing message when extraction finds nothing.
pub const NO_SYMPTOMS_MESSAGE: &str =
    "I am unable to identify any recognizable symptoms from the provided input.";

/// Error response body: `{"success": false, "code", "message", "errors"?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation error: {0:?}")]
    Validation(Vec<String>),
    #[error("No recognizable symptoms")]
    NoSymptoms,
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, errors) = match self {
            ApiError::Validation(errors) => {
                tracing::info!(?errors, "Request validation failed");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    "Validation error".to_string(),
                    Some(errors),
                )
            }
            ApiError::NoSymptoms => (
                StatusCode::BAD_REQUEST,
                "NO_SYMPTOMS",
                NO_SYMPTOMS_MESSAGE.to_string(),
                None,
            ),
            ApiError::Unavailable(detail) => {
                tracing::warn!(detail, "Symptom extractor unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "EXTRACTOR_UNAVAILABLE",
                    "Symptom extraction service is unavailable".to_string(),
                    None,
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            success: false,
            code,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DiagnosisError> for ApiError {
    fn from(err: DiagnosisError) -> Self {
        match err {
            DiagnosisError::NoSymptoms => ApiError::NoSymptoms,
            DiagnosisError::Extraction(e) if e.is_unavailable() => ApiError::Unavailable(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
