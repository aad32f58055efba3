// HTTP surface of the auth core
// Thin transport layer: bind the request, call one core operation, map the
// result through the shared error taxonomy.

pub mod auth;
pub mod device_tokens;
pub mod internal;
pub mod users;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};

use crate::app::AppState;
use crate::middleware::{admin_middleware, auth_middleware, internal_middleware};

/// Public authentication routes. Logout runs behind the user gate so the
/// caller's access id is available from context.
pub fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(auth::logout))
        .route_layer(axum_middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/token/verify", post(auth::verify_token))
        .merge(protected)
}

/// Authenticated user-facing routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(users::me))
        .route(
            "/device-tokens",
            post(device_tokens::register).delete(device_tokens::unregister),
        )
        .route_layer(axum_middleware::from_fn_with_state(state, auth_middleware))
}

/// Internal routes, guarded by the inter-service gate. User-management
/// mutations additionally pass the admin gate.
pub fn internal_routes(state: AppState) -> Router<AppState> {
    let admin_guarded = Router::new()
        .route("/users/{id}", put(users::update_user))
        .route("/users/{id}/password", put(users::update_user_password))
        .route(
            "/users/{id}/ban",
            post(users::ban_user).delete(users::unban_user),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ));

    Router::new()
        .route("/token/generate", post(internal::generate_token))
        .route("/token/verify", post(internal::verify_token))
        .route("/token/validate", post(internal::validate_token))
        .route("/token/refresh/admin", post(internal::admin_refresh))
        .route("/users/count", get(users::count_users))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/device-tokens", get(device_tokens::list_for_user))
        .merge(admin_guarded)
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            internal_middleware,
        ))
}
