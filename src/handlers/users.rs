// User profile and internal user-management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::user::{User, UserCursor, UserError},
    services::UpdateUserInput,
    utils::auth_errors::AuthError,
};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub is_banned: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            email: user.email,
            roles: user.roles,
            is_banned: user.is_banned,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CountUsersResponse {
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
    pub is_banned: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub new_password: String,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// GET /api/v1/me - Profile of the authenticated user
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, AuthError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let record = User::find_by_id(&mut conn, user.user_id).await?;
    Ok(Json(record.into()))
}

/// GET /internal/auth/users/count
pub async fn count_users(
    State(state): State<AppState>,
) -> Result<Json<CountUsersResponse>, AuthError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let count = User::count(&mut conn).await?;
    Ok(Json(CountUsersResponse { count }))
}

/// GET /internal/auth/users - Cursor-paginated listing, newest first
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>, AuthError> {
    let cursor = match query.cursor.as_deref() {
        Some(token) => Some(
            UserCursor::decode(token)
                .ok_or_else(|| AuthError::Validation("invalid cursor".to_string()))?,
        ),
        None => None,
    };

    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let users = User::list(&mut conn, cursor, limit).await?;

    // A short page means the listing is exhausted
    let next_cursor = if users.len() as i64 == limit {
        users.last().map(|u| {
            UserCursor {
                created_at: u.created_at,
                id: u.id,
            }
            .encode()
        })
    } else {
        None
    };

    Ok(Json(ListUsersResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
        next_cursor,
    }))
}

/// GET /internal/auth/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AuthError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let user = User::find_by_id(&mut conn, id).await.map_err(|e| match e {
        UserError::NotFound => AuthError::UserNotFound,
        other => other.into(),
    })?;

    Ok(Json(user.into()))
}

/// PUT /internal/auth/users/:id - Partial update of email, roles, ban flag
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = state
        .credential_service
        .update_fields(
            id,
            UpdateUserInput {
                email: req.email,
                roles: req.roles,
                is_banned: req.is_banned,
            },
        )
        .await?;

    Ok(Json(user.into()))
}

/// PUT /internal/auth/users/:id/password - Re-hash and store a new password;
/// every live session for the user is dropped.
pub async fn update_user_password(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    state
        .credential_service
        .update_password(id, &req.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /internal/auth/users/:id/ban
pub async fn ban_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AuthError> {
    state.credential_service.set_banned(id, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /internal/auth/users/:id/ban
pub async fn unban_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AuthError> {
    state.credential_service.set_banned(id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}
