//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain_leads::LeadError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Claim cap exceeded (refund issued: {refund_issued})")]
    CapExceeded { refund_issued: bool },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "refundIssued", skip_serializing_if = "Option::is_none")]
    pub refund_issued: Option<bool>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized".to_string())
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::CapExceeded { .. } => (
                StatusCode::CONFLICT,
                "cap_exceeded",
                "Claim slot no longer available".to_string(),
            ),
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg.clone())
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let refund_issued = match &self {
            ApiError::CapExceeded { refund_issued } => Some(*refund_issued),
            _ => None,
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            refund_issued,
        };

        (status, Json(body)).into_response()
    }
}

impl From<core_kernel::PortError> for ApiError {
    fn from(err: core_kernel::PortError) -> Self {
        ApiError::from(LeadError::from(err))
    }
}

impl From<LeadError> for ApiError {
    fn from(err: LeadError) -> Self {
        match err {
            LeadError::JobNotFound => ApiError::NotFound("Job not found".to_string()),
            LeadError::JobNotOpen(_)
            | LeadError::JobFull
            | LeadError::DuplicateClaim
            | LeadError::PaymentNotConfirmed { .. } => ApiError::BadRequest(err.to_string()),
            LeadError::CapExceeded { refund_issued } => ApiError::CapExceeded { refund_issued },
            LeadError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            LeadError::Validation(msg) => ApiError::Validation(msg),
            LeadError::PaymentSessionFailed(ref source)
            | LeadError::Gateway(ref source)
            | LeadError::Store(ref source) => {
                if source.is_transient() {
                    ApiError::ServiceUnavailable(err.to_string())
                } else {
                    ApiError::Internal(err.to_string())
                }
            }
        }
    }
}
