// Policy gates for protected routes
// Three guards: authenticated user (bearer JWT), internal caller (static
// shared secret or inter-service JWT), and admin (user JWT carrying the
// admin role). Each gate validates the principal and injects it into the
// request extensions for handlers.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::{
    app::AppState,
    middleware::auth::{AuthenticatedUser, InternalCaller, STATIC_SECRET_SUBJECT},
    utils::auth_errors::AuthError,
    utils::metrics::{self, VERIFY_TYPE_ACCESS, VERIFY_TYPE_INTER_SERVICE},
};

const INTERNAL_TOKEN_HEADER: &str = "x-internal-service-token";
const ADMIN_AUTH_HEADER: &str = "x-admin-authorization";

fn bearer_token<'a>(header_value: Option<&'a str>) -> Option<&'a str> {
    header_value.and_then(|h| h.strip_prefix("Bearer "))
}

/// Guard 1: authenticated user.
/// Requires `Authorization: Bearer <jwt>`; on success the handler sees the
/// user id, the access `jti` and the role set via `AuthenticatedUser`.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match bearer_token(header_value) {
        Some(token) => token,
        None => {
            metrics::record_token_verification(VERIFY_TYPE_ACCESS, false);
            return AuthError::TokenMalformed.into_response();
        }
    };

    match app_state.verifier.verify_user_access(token).await {
        Ok(claims) => {
            let user_id = match claims.user_id() {
                Some(id) => id,
                None => {
                    metrics::record_token_verification(VERIFY_TYPE_ACCESS, false);
                    return AuthError::TokenInvalid.into_response();
                }
            };
            metrics::record_token_verification(VERIFY_TYPE_ACCESS, true);

            request.extensions_mut().insert(AuthenticatedUser {
                user_id,
                access_id: claims.jti,
                roles: claims.roles,
            });

            next.run(request).await
        }
        Err(e) => {
            metrics::record_token_verification(VERIFY_TYPE_ACCESS, false);
            tracing::debug!("access token verification failed: {}", e);
            e.into_response()
        }
    }
}

/// Guard 2: internal caller.
/// Requires `X-Internal-Service-Token`. Path A admits the configured static
/// shared secret (constant-time compare) with a synthetic subject; path B
/// verifies the value as an inter-service JWT.
pub async fn internal_middleware(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let presented = match request
        .headers()
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
    {
        Some(value) if !value.is_empty() => value,
        _ => {
            metrics::record_token_verification(VERIFY_TYPE_INTER_SERVICE, false);
            return AuthError::TokenInvalid.into_response();
        }
    };

    let static_secret = &app_state.config.tokens.inter_service_secret;
    let is_static = !static_secret.is_empty()
        && presented.as_bytes().ct_eq(static_secret.as_bytes()).into();

    let caller = if is_static {
        InternalCaller {
            service: STATIC_SECRET_SUBJECT.to_string(),
        }
    } else {
        match app_state.verifier.verify_inter_service(presented) {
            Ok(claims) => InternalCaller {
                service: claims.sub,
            },
            Err(e) => {
                metrics::record_token_verification(VERIFY_TYPE_INTER_SERVICE, false);
                tracing::debug!("inter-service token verification failed: {}", e);
                return e.into_response();
            }
        }
    };

    metrics::record_token_verification(VERIFY_TYPE_INTER_SERVICE, true);
    request.extensions_mut().insert(caller);
    next.run(request).await
}

/// Guard 3: admin. Runs after the internal gate.
/// Requires `X-Admin-Authorization: Bearer <jwt>` holding a live,
/// unbanned user carrying the admin role.
pub async fn admin_middleware(
    State(app_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(ADMIN_AUTH_HEADER)
        .and_then(|h| h.to_str().ok());

    let token = match bearer_token(header_value) {
        Some(token) => token,
        None => {
            metrics::record_token_verification(VERIFY_TYPE_ACCESS, false);
            return AuthError::TokenMalformed.into_response();
        }
    };

    // Ban state matters here, so the full validate flow runs, not the bare
    // verifier.
    match app_state.verifier.validate_and_check_user(token).await {
        Ok(claims) if claims.is_admin() => {
            metrics::record_token_verification(VERIFY_TYPE_ACCESS, true);
            next.run(request).await
        }
        Ok(_) => {
            metrics::record_token_verification(VERIFY_TYPE_ACCESS, false);
            AuthError::Forbidden.into_response()
        }
        Err(e) => {
            metrics::record_token_verification(VERIFY_TYPE_ACCESS, false);
            tracing::debug!("admin token verification failed: {}", e);
            e.into_response()
        }
    }
}

/// Extractor for AuthenticatedUser from request extensions
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::TokenInvalid)
    }
}

/// Extractor for InternalCaller from request extensions
impl FromRequestParts<AppState> for InternalCaller {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<InternalCaller>()
            .cloned()
            .ok_or(AuthError::TokenInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(Some("bearer abc")), None);
        assert_eq!(bearer_token(Some("Token abc")), None);
        assert_eq!(bearer_token(None), None);
    }
}
