// Error taxonomy for the auth core
// Service layers return these kinds; the transport maps them to HTTP status
// codes in one place.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use thiserror::Error;

use crate::models::device_token::DeviceTokenError;
use crate::models::user::UserError;
use crate::services::token_index::TokenIndexError;
use crate::services::tokens::TokenError;
use crate::utils::password::PasswordError;

/// Authentication and session errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Wrong password, unknown user, or banned user at login. Deliberately
    /// opaque so login cannot be used to probe ban state.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Token malformed")]
    TokenMalformed,

    #[error("Token invalid")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    /// Token absent from the revocation index: revoked or already expired
    #[error("Token not found")]
    TokenNotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    Internal(String),
}

/// Standard error response body
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub description: String,
}

impl AuthError {
    /// Convert to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UserAlreadyExists => StatusCode::CONFLICT,
            AuthError::EmailAlreadyExists => StatusCode::CONFLICT,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::TokenMalformed => StatusCode::UNAUTHORIZED,
            AuthError::TokenInvalid => StatusCode::UNAUTHORIZED,
            AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::TokenNotFound => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::UserAlreadyExists => "USER_ALREADY_EXISTS",
            AuthError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::TokenMalformed => "TOKEN_MALFORMED",
            AuthError::TokenInvalid => "TOKEN_INVALID",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::TokenNotFound => "TOKEN_NOT_FOUND",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for the *internal* kind only. Logout uses this to decide whether
    /// a cleanup failure is worth surfacing at all.
    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::Internal(_))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        // Internal details stay in the logs, not the response body
        if let AuthError::Internal(ref detail) = self {
            tracing::error!(error = %detail, "internal error surfaced to client");
        }

        let response = AuthErrorResponse {
            success: false,
            error: ErrorDetail {
                code: self.error_code().to_string(),
                description: self.to_string(),
            },
            message: self.to_string(),
        };

        (status, Json(response)).into_response()
    }
}

impl From<UserError> for AuthError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound => AuthError::UserNotFound,
            UserError::UsernameTaken => AuthError::UserAlreadyExists,
            UserError::EmailTaken => AuthError::EmailAlreadyExists,
            UserError::Database(e) => AuthError::Internal(e.to_string()),
            UserError::Pool(e) => AuthError::Internal(e),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Malformed => AuthError::TokenMalformed,
            TokenError::Invalid => AuthError::TokenInvalid,
            TokenError::Signing(e) => AuthError::Internal(e),
        }
    }
}

impl From<TokenIndexError> for AuthError {
    fn from(e: TokenIndexError) -> Self {
        match e {
            TokenIndexError::NotFound => AuthError::TokenNotFound,
            TokenIndexError::Store(e) => AuthError::Internal(e),
        }
    }
}

impl From<DeviceTokenError> for AuthError {
    fn from(e: DeviceTokenError) -> Self {
        match e {
            DeviceTokenError::Database(e) => AuthError::Internal(e.to_string()),
            DeviceTokenError::Pool(e) => AuthError::Internal(e),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        AuthError::Internal(e.to_string())
    }
}
