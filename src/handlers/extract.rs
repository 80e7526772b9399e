use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::error::{error_body, service_error_to_response, HandlerError};
use crate::models::ServiceError;

/// `Json` body whose rejections use the service error envelope.
///
/// Undecodable or incomplete bodies are validation failures (400); size and
/// media-type rejections keep their own status.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection_to_response(rejection)),
        }
    }
}

pub fn json_rejection_to_response(rejection: JsonRejection) -> HandlerError {
    let status = rejection.status();
    let message = rejection.body_text();
    warn!(status = %status, error = %message, "Rejected request body");

    match status {
        StatusCode::PAYLOAD_TOO_LARGE | StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            error_body(status, message)
        }
        _ => service_error_to_response(ServiceError::validation(message)),
    }
}
