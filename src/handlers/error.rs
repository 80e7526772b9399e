use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::error;

use crate::models::{RepositoryError, ServiceError};

/// Error half of every handler result
pub type HandlerError = (StatusCode, Json<Value>);

/// Convert ServiceError to HTTP response
pub fn service_error_to_response(err: ServiceError) -> HandlerError {
    let (status, message) = match err {
        ServiceError::CategoryNotFound { .. }
        | ServiceError::ProductNotFound { .. }
        | ServiceError::NotFound { .. }
        | ServiceError::CartItemNotFound { .. }
        | ServiceError::CheckoutNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),

        ServiceError::ValidationError { .. }
        | ServiceError::CyclicCategoryParent { .. }
        | ServiceError::InvalidMenuItemParent { .. }
        | ServiceError::CategoryHasChildren { .. }
        | ServiceError::EmptyCart { .. }
        | ServiceError::PaymentNotEligible { .. }
        | ServiceError::InvalidCredentials => (StatusCode::BAD_REQUEST, err.to_string()),

        ServiceError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, err.to_string()),
        ServiceError::Forbidden { .. } => (StatusCode::FORBIDDEN, err.to_string()),

        ServiceError::Conflict { .. }
        | ServiceError::InsufficientStock { .. }
        | ServiceError::ProductUnavailable { .. }
        | ServiceError::CheckoutCompleted { .. } => (StatusCode::CONFLICT, err.to_string()),

        ServiceError::Repository { source } => match source {
            RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            RepositoryError::ConstraintViolation { message } => (StatusCode::CONFLICT, message),
            RepositoryError::InvalidQuery { message } => (StatusCode::BAD_REQUEST, message),
            RepositoryError::ConnectionFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".to_string(),
            ),
            RepositoryError::Timeout => {
                (StatusCode::REQUEST_TIMEOUT, "Request timeout".to_string())
            }
            RepositoryError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded".to_string(),
            ),
            other => {
                error!(error = %other, "Repository failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        },
        ServiceError::Configuration { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Configuration error".to_string(),
        ),
        ServiceError::ExternalService { .. } => (
            StatusCode::BAD_GATEWAY,
            "External service error".to_string(),
        ),
        ServiceError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };

    error_body(status, message)
}

pub fn error_body(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(json!({
            "error": message.into(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
