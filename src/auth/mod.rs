//! Token issuance, password hashing and the request extractor that turns a
//! bearer token into an [`AuthUser`].

pub mod extractor;
pub mod jwt;
pub mod password;

use thiserror::Error;

use crate::models::ServiceError;

pub use extractor::{AuthRejection, AuthUser};
pub use jwt::{extract_bearer_token, Claims, JwtManager};
pub use password::{generate_reset_token, hash_password, verify_password};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Failed to issue token: {0}")]
    Encoding(String),

    #[error("Failed to hash password: {0}")]
    PasswordHash(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::TokenExpired => {
                ServiceError::Unauthorized {
                    message: err.to_string(),
                }
            }
            AuthError::Encoding(_) | AuthError::PasswordHash(_) => ServiceError::Internal {
                message: err.to_string(),
            },
        }
    }
}
