// Credential lifecycle: registration, ban toggle, password update
// State changes that invalidate existing sessions fan out into the token
// index; the primary store write always lands first and the index cleanup is
// best-effort (stale tokens die at verify time via the ban check).

use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::user::{NewUser, User, UserError, UserUpdate, ROLE_USER};
use crate::services::token_index::TokenIndex;
use crate::utils::auth_errors::AuthError;
use crate::utils::metrics;
use crate::utils::password::hash_password;
use crate::utils::validation::{
    normalize_email, validate_email, validate_password_strength, validate_username,
};

/// Validated registration input
#[derive(Debug, Clone)]
pub struct RegistrationInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Partial admin update of a user record
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
    pub is_banned: Option<bool>,
}

pub struct CredentialService {
    diesel_pool: DieselPool,
    index: TokenIndex,
    pepper: String,
}

impl CredentialService {
    pub fn new(diesel_pool: DieselPool, index: TokenIndex, pepper: String) -> Self {
        Self {
            diesel_pool,
            index,
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

    async fn hash_on_blocking_pool(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let pepper = self.pepper.clone();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password, &pepper))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;
        Ok(hash)
    }

    /// Register a new account: validate, normalise, check uniqueness, hash,
    /// insert. Uniqueness is re-checked by the store at insertion, so a
    /// racing duplicate still surfaces as the right conflict kind.
    pub async fn register(&self, input: RegistrationInput) -> Result<User, AuthError> {
        validate_username(&input.username).map_err(AuthError::Validation)?;
        validate_password_strength(&input.password).map_err(AuthError::Validation)?;
        validate_email(&input.email).map_err(AuthError::Validation)?;

        let email = normalize_email(&input.email);

        {
            let mut conn = self.get_conn().await?;

            match User::find_by_username(&mut conn, &input.username).await {
                Ok(_) => return Err(AuthError::UserAlreadyExists),
                Err(UserError::NotFound) => {}
                Err(e) => return Err(e.into()),
            }

            match User::find_by_email(&mut conn, &email).await {
                Ok(_) => return Err(AuthError::EmailAlreadyExists),
                Err(UserError::NotFound) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let password_hash = self.hash_on_blocking_pool(&input.password).await?;

        let new_user = NewUser {
            username: input.username.clone(),
            email,
            password_hash,
            // New accounts show their username until they pick a display name
            display_name: input.username,
            roles: vec![ROLE_USER.to_string()],
        };

        let user = {
            let mut conn = self.get_conn().await?;
            User::create(&mut conn, new_user).await?
        };

        metrics::AUTH_REGISTRATIONS_TOTAL.inc();
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");

        Ok(user)
    }

    /// Toggle the ban flag. Idempotent. Turning the ban ON drops every live
    /// session for the user after the flag is persisted.
    pub async fn set_banned(&self, user_id: Uuid, banned: bool) -> Result<User, AuthError> {
        let user = {
            let mut conn = self.get_conn().await?;
            User::set_banned(&mut conn, user_id, banned).await?
        };

        if banned {
            self.cascade_revoke(user_id).await;
        }

        Ok(user)
    }

    /// Re-hash and store a new password, then drop every live session
    pub async fn update_password(
        &self,
        user_id: Uuid,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password_strength(new_password).map_err(AuthError::Validation)?;

        let new_hash = self.hash_on_blocking_pool(new_password).await?;

        {
            let mut conn = self.get_conn().await?;
            User::update_password_hash(&mut conn, user_id, &new_hash).await?;
        }

        self.cascade_revoke(user_id).await;
        Ok(())
    }

    /// Apply a partial admin update. A ban flag flipping on cascades exactly
    /// like `set_banned`.
    pub async fn update_fields(
        &self,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> Result<User, AuthError> {
        let email = match input.email {
            Some(raw) => {
                validate_email(&raw).map_err(AuthError::Validation)?;
                Some(normalize_email(&raw))
            }
            None => None,
        };

        if let Some(ref roles) = input.roles {
            if roles.is_empty() {
                return Err(AuthError::Validation(
                    "roles must not be empty".to_string(),
                ));
            }
        }

        let mut update = UserUpdate::new();
        update.email = email;
        update.roles = input.roles;
        update.is_banned = input.is_banned;

        let user = {
            let mut conn = self.get_conn().await?;
            User::update_fields(&mut conn, user_id, update).await?
        };

        if input.is_banned == Some(true) {
            self.cascade_revoke(user_id).await;
        }

        Ok(user)
    }

    /// Best-effort session cascade. Failures are logged and metered but never
    /// roll back the primary mutation: the ban check at verify time is the
    /// backstop, so momentary session survival is bounded by the access TTL.
    async fn cascade_revoke(&self, user_id: Uuid) {
        match self.index.delete_all_for_user(user_id).await {
            Ok(deleted) => {
                tracing::info!(user_id = %user_id, deleted, "session cascade completed");
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "session cascade failed");
            }
        }
    }
}
