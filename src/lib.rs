// Library exports for the auth core
// Exposes modules and functions for library consumers and the test suite

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use db::{DieselPool, RedisConfig, RedisPool};
pub use middleware::{
    admin_middleware, auth_middleware, internal_middleware, AuthenticatedUser, InternalCaller,
};
pub use models::auth::{InterServiceClaims, UserClaims};
pub use models::device_token::{DeviceToken, Platform};
pub use models::user::{User, UserCursor, UserError, ROLE_ADMIN, ROLE_USER};
pub use services::{
    CredentialService, DeviceTokenService, RegistrationInput, SessionService, SessionTokens,
    TokenConfig, TokenError, TokenIndex, TokenIndexError, TokenService, UpdateUserInput, Verifier,
};
pub use utils::{hash_password, verify_password, AuthError, PasswordError};

// Re-export route builders
pub use handlers::{api_routes, auth_routes, internal_routes};

use std::sync::Arc;

/// Wire up pools and services into the shared application state.
/// The transport surface in `main.rs` is a thin layer over this.
pub async fn initialize_app_state() -> Result<AppState, Box<dyn std::error::Error>> {
    use tracing::info;

    dotenv::dotenv().ok();

    let config = app_config::config();

    info!("Initializing database pool...");
    let db_config = db::diesel_pool::DieselDatabaseConfig::default();
    let max_connections = db_config.max_connections;
    let diesel_pool = db::create_diesel_pool(db_config).await?;

    info!("Initializing Redis pool...");
    let redis_config = RedisConfig::from_env();
    let redis_pool = RedisPool::new(redis_config).await?;

    let token_service = Arc::new(TokenService::from_env());
    let token_index = TokenIndex::new(redis_pool.clone());

    let verifier = Arc::new(Verifier::new(
        token_service.clone(),
        token_index.clone(),
        diesel_pool.clone(),
    ));
    let session_service = Arc::new(SessionService::new(
        token_service.clone(),
        token_index.clone(),
        diesel_pool.clone(),
        config.security.password_pepper.clone(),
    ));
    let credential_service = Arc::new(CredentialService::new(
        diesel_pool.clone(),
        token_index,
        config.security.password_pepper.clone(),
    ));
    let device_token_service = Arc::new(DeviceTokenService::new(diesel_pool.clone()));

    Ok(AppState {
        config: Arc::new(config.clone()),
        diesel_pool,
        redis_pool,
        token_service,
        verifier,
        session_service,
        credential_service,
        device_token_service,
        max_connections,
    })
}

/// Health check handler: component checks for Postgres and Redis
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    use axum::Json;

    let mut overall_healthy = true;
    let timestamp = chrono::Utc::now().to_rfc3339();

    let postgres_health = match db::check_diesel_health(&state.diesel_pool).await {
        Ok(_) => serde_json::json!({
            "status": "healthy",
            "max_connections": state.max_connections,
            "error": null
        }),
        Err(e) => {
            overall_healthy = false;
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("Database connection failed: {}", e)
            })
        }
    };

    let redis_health = state.redis_pool.health_check().await;
    if !redis_health.is_healthy {
        overall_healthy = false;
    }

    let response = serde_json::json!({
        "status": if overall_healthy { "healthy" } else { "degraded" },
        "service": "story-auth-core",
        "timestamp": timestamp,
        "components": {
            "postgresql": postgres_health,
            "redis": serde_json::json!({
                "status": if redis_health.is_healthy { "healthy" } else { "unhealthy" },
                "latency_ms": redis_health.latency_ms,
                "error": redis_health.error
            })
        }
    });

    if overall_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Prometheus text exposition for the process-wide auth counters
pub async fn metrics_handler() -> impl axum::response::IntoResponse {
    utils::metrics::gather()
}
