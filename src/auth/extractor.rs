use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use super::{extract_bearer_token, AuthError, JwtManager};
use crate::models::{Role, ServiceError, ServiceResult};

/// Caller identity taken from a validated bearer token.
///
/// ```rust,ignore
/// async fn handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub roles: Vec<Role>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    pub fn ensure_admin(&self) -> ServiceResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::forbidden("Administrator role required"))
        }
    }

    /// Allow the owner of a resource, or any administrator
    pub fn ensure_owner_or_admin(&self, owner_id: i64) -> ServiceResult<()> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::forbidden(format!(
                "User {} cannot access resources of user {}",
                self.user_id, owner_id
            )))
        }
    }
}

/// Why a request carried no usable identity
#[derive(Debug)]
pub enum AuthRejection {
    MissingToken,
    InvalidToken(String),
    TokenExpired,
}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => AuthRejection::TokenExpired,
            AuthError::MissingToken => AuthRejection::MissingToken,
            other => AuthRejection::InvalidToken(other.to_string()),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            AuthRejection::MissingToken => "Missing bearer token".to_string(),
            AuthRejection::InvalidToken(reason) => reason,
            AuthRejection::TokenExpired => "Token expired".to_string(),
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": message,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        )
            .into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jwt = Arc::<JwtManager>::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or(AuthRejection::MissingToken)?;

        let claims = jwt.validate_token(token).map_err(|err| {
            warn!(error = %err, path = %parts.uri.path(), "Rejected bearer token");
            AuthRejection::from(err)
        })?;

        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AuthRejection::InvalidToken("Malformed subject claim".to_string()))?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
            name: claims.name,
            roles: claims.roles,
        })
    }
}
