// Module declarations
pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

// Re-export CONFIG for use in other modules
pub use app_config::CONFIG;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    app::AppState,
    db::{create_diesel_pool, mask_connection_string, DieselDatabaseConfig, RedisConfig, RedisPool},
    handlers::{api_routes, auth_routes, internal_routes},
    services::{
        CredentialService, DeviceTokenService, SessionService, TokenIndex, TokenService, Verifier,
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle version flag for container health checks - must be FIRST
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--version" {
        println!("story-auth-core v{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "story_auth_core=debug,axum=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize centralized config (loads all env vars ONCE)
    let config = crate::app_config::config();
    let bind_address = config.bind_address.clone();
    info!("=== STARTING STORY AUTH CORE ===");
    info!("Starting auth service on {}", bind_address);

    // Initialize Diesel database pool
    info!("Initializing database pool...");
    let db_config = DieselDatabaseConfig::default();
    info!("Database URL: {}", mask_connection_string(&db_config.url));

    let max_connections = db_config.max_connections;
    let diesel_pool = match create_diesel_pool(db_config).await {
        Ok(pool) => {
            info!("Database connection pool initialized successfully");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database pool: {}", e);
            return Err(format!("Database initialization failed: {}", e).into());
        }
    };

    // Initialize Redis pool
    info!("Initializing Redis pool...");
    let redis_config = RedisConfig::from_env();
    let redis_pool = match RedisPool::new(redis_config).await {
        Ok(pool) => {
            info!("Redis connection pool initialized successfully");
            pool
        }
        Err(e) => {
            error!("Failed to initialize Redis pool: {}", e);
            return Err(format!("Redis initialization failed: {}", e).into());
        }
    };

    // Initialize services
    info!("Initializing token services...");
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
    info!("Services initialized successfully");

    // Create shared application state
    let app_state = AppState {
        config: Arc::new(config.clone()),
        diesel_pool,
        redis_pool,
        token_service,
        verifier,
        session_service,
        credential_service,
        device_token_service,
        max_connections,
    };

    // Configure CORS from the allow-list; wildcard means any origin
    let cors = if config.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    // Build the application router
    let app = Router::new()
        .route("/health", get(comprehensive_health_check))
        .route("/metrics", get(metrics_handler))
        .nest("/auth", auth_routes(app_state.clone()))
        .nest("/api/v1", api_routes(app_state.clone()))
        .nest("/internal/auth", internal_routes(app_state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app_state);

    // Parse and bind to address
    let addr: SocketAddr = bind_address.parse()?;
    info!("Starting HTTP server on {}...", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

// Health check handler
async fn comprehensive_health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    use axum::Json;
    use serde_json::json;

    let mut overall_healthy = true;
    let timestamp = chrono::Utc::now().to_rfc3339();

    // Diesel/PostgreSQL health check
    let postgres_health = match db::check_diesel_health(&state.diesel_pool).await {
        Ok(_) => {
            json!({
                "status": "healthy",
                "max_connections": state.max_connections,
                "error": null
            })
        }
        Err(e) => {
            overall_healthy = false;
            json!({
                "status": "unhealthy",
                "error": format!("Database connection failed: {}", e)
            })
        }
    };

    // Redis health check
    let redis_health_result = state.redis_pool.health_check().await;
    if !redis_health_result.is_healthy {
        overall_healthy = false;
    }
    let redis_health = json!({
        "status": if redis_health_result.is_healthy { "healthy" } else { "unhealthy" },
        "latency_ms": redis_health_result.latency_ms,
        "active_connections": redis_health_result.active_connections,
        "total_connections": redis_health_result.total_connections,
        "error": redis_health_result.error
    });

    let response = json!({
        "status": if overall_healthy { "healthy" } else { "degraded" },
        "service": "story-auth-core",
        "timestamp": timestamp,
        "components": {
            "postgresql": postgres_health,
            "redis": redis_health
        }
    });

    if overall_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

// Prometheus text exposition for the process-wide auth counters
async fn metrics_handler() -> impl axum::response::IntoResponse {
    crate::utils::metrics::gather()
}
