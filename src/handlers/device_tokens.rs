// Device token handlers for the authenticated API surface

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    app::AppState, middleware::auth::AuthenticatedUser, utils::auth_errors::AuthError,
};

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceTokenRequest {
    pub token: String,
    pub platform: String,
}

#[derive(Debug, Deserialize)]
pub struct UnregisterDeviceTokenRequest {
    pub token: String,
}

/// POST /api/v1/device-tokens - Register the caller's device for push
pub async fn register(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<RegisterDeviceTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    state
        .device_token_service
        .register(user.user_id, &req.token, &req.platform)
        .await?;

    Ok(StatusCode::CREATED)
}

/// DELETE /api/v1/device-tokens - Drop one of the caller's device tokens
pub async fn unregister(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(req): Json<UnregisterDeviceTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    state.device_token_service.unregister(&req.token).await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Serialize)]
pub struct DeviceTokenResponse {
    pub token: String,
    pub platform: String,
}

/// GET /internal/auth/users/:id/device-tokens - Tokens registered for one
/// user, consumed by the push fan-out service
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DeviceTokenResponse>>, AuthError> {
    let tokens = state.device_token_service.list_for_user(id).await?;

    Ok(Json(
        tokens
            .into_iter()
            .map(|t| DeviceTokenResponse {
                token: t.token,
                platform: t.platform,
            })
            .collect(),
    ))
}
