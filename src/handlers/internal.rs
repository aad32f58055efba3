// Inter-service token handlers and the admin refresh endpoint
// All routes here sit behind the internal gate: callers present either the
// static shared secret or a live inter-service JWT.

use axum::{
    extract::State,
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    app::AppState,
    handlers::auth::TokenPairResponse,
    middleware::auth::InternalCaller,
    models::auth::UserClaims,
    utils::auth_errors::AuthError,
    utils::metrics::{self, VERIFY_TYPE_ACCESS, VERIFY_TYPE_INTER_SERVICE},
};

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateTokenRequest {
    pub service_name: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateTokenResponse {
    pub inter_service_token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyInterServiceResponse {
    pub service_name: String,
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidateTokenResponse {
    pub user_id: Uuid,
    pub roles: Vec<String>,
    pub access_id: String,
    pub expires_at: u64,
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdminRefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AdminRefreshResponse {
    pub tokens: TokenPairResponse,
    pub claims: UserClaims,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// POST /internal/auth/token/generate - Issue an inter-service token for the
/// named service. This is the call bootstrap relies on: the first request
/// authenticates with the static shared secret, everything after with the
/// token minted here.
pub async fn generate_token(
    State(state): State<AppState>,
    caller: InternalCaller,
    Json(req): Json<GenerateTokenRequest>,
) -> Result<Json<GenerateTokenResponse>, AuthError> {
    let service_name = req.service_name.trim();
    if service_name.is_empty() {
        return Err(AuthError::Validation(
            "service_name must not be empty".to_string(),
        ));
    }

    let token = state.token_service.generate_inter_service_token(service_name)?;

    metrics::AUTH_INTER_SERVICE_TOKENS_GENERATED_TOTAL.inc();
    tracing::info!(
        service = %service_name,
        requested_by = %caller.service,
        "inter-service token issued"
    );

    Ok(Json(GenerateTokenResponse {
        inter_service_token: token,
    }))
}

/// POST /internal/auth/token/verify - Verify an inter-service token and
/// report its subject
pub async fn verify_token(
    State(state): State<AppState>,
    Json(req): Json<VerifyTokenRequest>,
) -> Result<Json<VerifyInterServiceResponse>, AuthError> {
    let result = state.verifier.verify_inter_service(&req.token);
    metrics::record_token_verification(VERIFY_TYPE_INTER_SERVICE, result.is_ok());

    let claims = result?;
    Ok(Json(VerifyInterServiceResponse {
        service_name: claims.sub,
        valid: true,
    }))
}

/// POST /internal/auth/token/validate - Full user-token validation for other
/// services: signature, expiry, revocation lookup, fresh user load and ban
/// check. A banned or deleted user comes back as *token invalid*.
pub async fn validate_token(
    State(state): State<AppState>,
    Json(req): Json<VerifyTokenRequest>,
) -> Result<Json<ValidateTokenResponse>, AuthError> {
    let result = state.verifier.validate_and_check_user(&req.token).await;
    metrics::record_token_verification(VERIFY_TYPE_ACCESS, result.is_ok());

    let claims = result?;
    let user_id = claims.user_id().ok_or(AuthError::TokenInvalid)?;

    Ok(Json(ValidateTokenResponse {
        user_id,
        roles: claims.roles,
        access_id: claims.jti,
        expires_at: claims.exp,
        valid: true,
    }))
}

/// POST /internal/auth/token/refresh/admin - Refresh reserved for admin
/// consoles: performs the standard rotation, then refuses banned or
/// non-admin users. The old refresh id is gone either way.
pub async fn admin_refresh(
    State(state): State<AppState>,
    Json(req): Json<AdminRefreshRequest>,
) -> Result<Json<AdminRefreshResponse>, AuthError> {
    let result = state.session_service.admin_refresh(&req.refresh_token).await;
    metrics::record_token_verification(
        crate::utils::metrics::VERIFY_TYPE_REFRESH,
        result.is_ok(),
    );

    let (pair, claims) = result?;
    Ok(Json(AdminRefreshResponse {
        tokens: pair.into(),
        claims,
    }))
}
