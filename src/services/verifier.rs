// Composite token verification
// Signature and expiry come from the token service; liveness comes from the
// revocation index; ban state comes from a fresh user load. Callers where
// ban state matters MUST use `validate_and_check_user`, not the bare
// access verification.

use std::sync::Arc;
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::auth::{InterServiceClaims, UserClaims};
use crate::models::user::{User, UserError};
use crate::services::token_index::{TokenIndex, TokenIndexError};
use crate::services::tokens::TokenService;
use crate::utils::auth_errors::AuthError;

pub struct Verifier {
    tokens: Arc<TokenService>,
    index: TokenIndex,
    diesel_pool: DieselPool,
}

impl Verifier {
    pub fn new(tokens: Arc<TokenService>, index: TokenIndex, diesel_pool: DieselPool) -> Self {
        Self {
            tokens,
            index,
            diesel_pool,
        }
    }

    /// Verify a user access token: HS256 signature, expiry, then the
    /// revocation lookup. An identifier absent from the index means the
    /// session was revoked or logged out, surfaced as *token invalid*.
    pub async fn verify_user_access(&self, token: &str) -> Result<UserClaims, AuthError> {
        let claims = self.tokens.decode_user_token(token)?;

        match self.index.user_by_access(&claims.jti).await {
            Ok(_) => Ok(claims),
            Err(TokenIndexError::NotFound) => Err(AuthError::TokenInvalid),
            Err(e @ TokenIndexError::Store(_)) => Err(e.into()),
        }
    }

    /// Full validation: the above plus a fresh user load and ban check.
    /// A banned user and a missing user both yield *token invalid* — the
    /// protected resource is uniformly "no access".
    pub async fn validate_and_check_user(&self, token: &str) -> Result<UserClaims, AuthError> {
        let claims = self.verify_user_access(token).await?;

        let user_id = claims.user_id().ok_or(AuthError::TokenInvalid)?;
        let user = self.load_user(user_id).await?;

        if user.is_banned {
            return Err(AuthError::TokenInvalid);
        }

        Ok(claims)
    }

    /// Verify an inter-service token. No index lookup: validity follows
    /// strictly from signature and expiry.
    pub fn verify_inter_service(&self, token: &str) -> Result<InterServiceClaims, AuthError> {
        Ok(self.tokens.decode_inter_service_token(token)?)
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        User::find_by_id(&mut conn, user_id)
            .await
            .map_err(|e| match e {
                UserError::NotFound => AuthError::TokenInvalid,
                other => other.into(),
            })
    }
}
