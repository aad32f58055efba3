// Session issuance, rotation and revocation
// Backed by the user store (credentials, roles, ban flag) and the Redis
// token index (session liveness).

use std::sync::Arc;
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::auth::UserClaims;
use crate::models::user::{User, UserError};
use crate::services::token_index::{TokenIndex, TokenIndexError};
use crate::services::tokens::{SessionTokens, TokenService};
use crate::utils::auth_errors::AuthError;
use crate::utils::metrics;
use crate::utils::password::verify_password;

pub struct SessionService {
    tokens: Arc<TokenService>,
    index: TokenIndex,
    diesel_pool: DieselPool,
    pepper: String,
}

impl SessionService {
    pub fn new(
        tokens: Arc<TokenService>,
        index: TokenIndex,
        diesel_pool: DieselPool,
        pepper: String,
    ) -> Self {
        Self {
            tokens,
            index,
            diesel_pool,
            pepper,
        }
    }

    async fn get_conn(
        &self,
    ) -> Result<
        bb8::PooledConnection<
            '_,
            diesel_async::pooled_connection::AsyncDieselConnectionManager<
                diesel_async::AsyncPgConnection,
            >,
        >,
        AuthError,
    > {
        self.diesel_pool
            .get()
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Authenticate and mint a session pair.
    ///
    /// Unknown username, wrong password and banned account all collapse into
    /// the same opaque *invalid credentials* so login cannot be used to probe
    /// account state.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionTokens, AuthError> {
        let user = {
            let mut conn = self.get_conn().await?;
            match User::find_by_username(&mut conn, username).await {
                Ok(user) => user,
                Err(UserError::NotFound) => return Err(AuthError::InvalidCredentials),
                Err(e) => return Err(e.into()),
            }
        };

        // bcrypt is CPU-bound; keep it off the async workers
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let pepper = self.pepper.clone();
        let matched = tokio::task::spawn_blocking(move || verify_password(&password, &hash, &pepper))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;

        if !matched || user.is_banned {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_and_store(&user).await
    }

    /// Revoke a session pair.
    ///
    /// The refresh identifier is parsed WITHOUT signature verification: the
    /// index, not the signature, is the source of truth here. Idempotent —
    /// identifiers already gone still count as success, and only a true
    /// store failure surfaces.
    pub async fn logout(&self, access_id: &str, refresh_token: &str) -> Result<(), AuthError> {
        let refresh_id = self
            .tokens
            .parse_user_claims_unverified(refresh_token)
            .map(|claims| claims.jti)
            .ok();

        match self.index.delete(Some(access_id), refresh_id.as_deref()).await {
            Ok(deleted) => {
                tracing::debug!(deleted, "logout removed index entries");
                Ok(())
            }
            Err(TokenIndexError::NotFound) => Ok(()),
            Err(e @ TokenIndexError::Store(_)) => Err(e.into()),
        }
    }

    /// Rotate a session: verify the refresh token, check it against the
    /// index, then mint and store a fresh pair. Both identifiers rotate; the
    /// old refresh identifier is removed and the old access entry dies by
    /// TTL.
    pub async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, AuthError> {
        let (claims, claim_user) = self.decode_refresh(refresh_token)?;
        self.check_refresh_binding(&claims.jti, claim_user).await?;

        // Roles are re-read from the store so a role change takes effect at
        // the next rotation
        let user = self.load_user_for_refresh(claim_user).await?;

        let pair = self.tokens.issue_session(user.id, &user.roles)?;

        if let Err(e) = self.index.delete(None, Some(&claims.jti)).await {
            tracing::warn!(jti = %claims.jti, error = %e, "failed to drop rotated refresh id");
        }

        self.store_pair(user.id, &pair).await?;

        metrics::AUTH_REFRESHES_TOTAL.inc();
        Ok(pair)
    }

    /// Refresh variant for admin consoles. The old refresh identifier is
    /// deleted BEFORE the user is read, so a guard failure leaves the caller
    /// with no stored refresh id, and a ban that slipped in concurrently is
    /// seen before the new pair is stored.
    pub async fn admin_refresh(
        &self,
        refresh_token: &str,
    ) -> Result<(SessionTokens, UserClaims), AuthError> {
        let (claims, claim_user) = self.decode_refresh(refresh_token)?;
        self.check_refresh_binding(&claims.jti, claim_user).await?;

        if let Err(e) = self.index.delete(None, Some(&claims.jti)).await {
            tracing::warn!(jti = %claims.jti, error = %e, "failed to drop rotated refresh id");
        }

        let user = self.load_user_for_refresh(claim_user).await?;

        if user.is_banned {
            return Err(AuthError::Forbidden);
        }
        if !user.is_admin() {
            return Err(AuthError::Forbidden);
        }

        let pair = self.issue_and_store(&user).await?;
        let new_claims = self.tokens.decode_user_token(&pair.access_token)?;

        metrics::AUTH_REFRESHES_TOTAL.inc();
        Ok((pair, new_claims))
    }

    /// Drop every live session for one user. Entry point for the admin
    /// forced-logout and for the ban / password-change cascades.
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, AuthError> {
        Ok(self.index.delete_all_for_user(user_id).await?)
    }

    fn decode_refresh(&self, refresh_token: &str) -> Result<(UserClaims, Uuid), AuthError> {
        let claims = self.tokens.decode_user_token(refresh_token)?;
        let claim_user = claims.user_id().ok_or(AuthError::TokenInvalid)?;
        Ok((claims, claim_user))
    }

    /// Check the refresh identifier against the index. A missing identifier
    /// means revoked; a stored user that disagrees with the embedded one is
    /// treated as attempted forgery and the identifier is dropped on the
    /// spot.
    async fn check_refresh_binding(&self, jti: &str, claim_user: Uuid) -> Result<(), AuthError> {
        let stored_user = match self.index.user_by_refresh(jti).await {
            Ok(user_id) => user_id,
            Err(TokenIndexError::NotFound) => return Err(AuthError::TokenNotFound),
            Err(e @ TokenIndexError::Store(_)) => return Err(e.into()),
        };

        if stored_user != claim_user {
            tracing::warn!(
                jti = %jti,
                stored = %stored_user,
                claimed = %claim_user,
                "refresh token user mismatch, dropping identifier"
            );
            if let Err(e) = self.index.delete(None, Some(jti)).await {
                tracing::warn!(jti = %jti, error = %e, "failed to drop mismatched refresh id");
            }
            return Err(AuthError::TokenInvalid);
        }

        Ok(())
    }

    async fn load_user_for_refresh(&self, user_id: Uuid) -> Result<User, AuthError> {
        let mut conn = self.get_conn().await?;
        User::find_by_id(&mut conn, user_id)
            .await
            .map_err(|e| match e {
                UserError::NotFound => AuthError::TokenInvalid,
                other => other.into(),
            })
    }

    async fn issue_and_store(&self, user: &User) -> Result<SessionTokens, AuthError> {
        let pair = self.tokens.issue_session(user.id, &user.roles)?;
        self.store_pair(user.id, &pair).await?;
        Ok(pair)
    }

    async fn store_pair(&self, user_id: Uuid, pair: &SessionTokens) -> Result<(), AuthError> {
        self.index
            .store_session(
                user_id,
                &pair.access_id,
                self.tokens.access_token_ttl(),
                &pair.refresh_id,
                self.tokens.refresh_token_ttl(),
            )
            .await?;
        Ok(())
    }
}
