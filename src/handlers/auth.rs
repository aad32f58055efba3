// Public authentication handlers
// Registration, login, logout, refresh and access-token verification

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    services::{RegistrationInput, SessionTokens},
    utils::auth_errors::AuthError,
    utils::metrics::{self, VERIFY_TYPE_ACCESS, VERIFY_TYPE_REFRESH},
};

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token pair returned by login and refresh
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
    pub access_id: String,
    pub refresh_id: String,
    pub access_exp: u64,
    pub refresh_exp: u64,
}

impl From<SessionTokens> for TokenPairResponse {
    fn from(pair: SessionTokens) -> Self {
        Self {
            access: pair.access_token,
            refresh: pair.refresh_token,
            access_id: pair.access_id,
            refresh_id: pair.refresh_id,
            access_exp: pair.access_expires_at,
            refresh_exp: pair.refresh_expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyTokenResponse {
    pub user_id: Uuid,
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub success: bool,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// POST /auth/register - Create a new account
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state
        .credential_service
        .register(RegistrationInput {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
    ))
}

/// POST /auth/login - Authenticate and mint a session pair
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, AuthError> {
    let pair = state
        .session_service
        .login(&req.username, &req.password)
        .await?;

    Ok(Json(pair.into()))
}

/// POST /auth/logout - Revoke the caller's session pair.
/// Idempotent: identifiers already gone still return success.
pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<OkResponse>, AuthError> {
    state
        .session_service
        .logout(&user.access_id, &req.refresh_token)
        .await?;

    Ok(Json(OkResponse { success: true }))
}

/// POST /auth/refresh - Rotate a session pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, AuthError> {
    let result = state.session_service.refresh(&req.refresh_token).await;
    metrics::record_token_verification(VERIFY_TYPE_REFRESH, result.is_ok());

    Ok(Json(result?.into()))
}

/// POST /auth/token/verify - Verify an access token and report its owner
pub async fn verify_token(
    State(state): State<AppState>,
    Json(req): Json<VerifyTokenRequest>,
) -> Result<Json<VerifyTokenResponse>, AuthError> {
    let result = state.verifier.verify_user_access(&req.token).await;
    metrics::record_token_verification(VERIFY_TYPE_ACCESS, result.is_ok());

    let claims = result?;
    let user_id = claims.user_id().ok_or(AuthError::TokenInvalid)?;

    Ok(Json(VerifyTokenResponse {
        user_id,
        valid: true,
    }))
}
