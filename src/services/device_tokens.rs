// Device token registration
// Thin orchestration over the registry with input validation; the push
// provider that consumes these lives in another service.

use std::str::FromStr;
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::device_token::{DeviceToken, NewDeviceToken, Platform};
use crate::utils::auth_errors::AuthError;

pub struct DeviceTokenService {
    diesel_pool: DieselPool,
}

impl DeviceTokenService {
    pub fn new(diesel_pool: DieselPool) -> Self {
        Self { diesel_pool }
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

    /// Register a device token for push routing
    pub async fn register(
        &self,
        user_id: Uuid,
        token: &str,
        platform: &str,
    ) -> Result<DeviceToken, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Validation("token must not be empty".to_string()));
        }

        let platform = Platform::from_str(platform).map_err(AuthError::Validation)?;

        let mut conn = self.get_conn().await?;
        let saved = DeviceToken::save(
            &mut conn,
            NewDeviceToken {
                token: token.to_string(),
                user_id,
                platform: platform.as_str().to_string(),
            },
        )
        .await?;

        Ok(saved)
    }

    /// Remove a device token; removing an unknown token succeeds
    pub async fn unregister(&self, token: &str) -> Result<(), AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Validation("token must not be empty".to_string()));
        }

        let mut conn = self.get_conn().await?;
        DeviceToken::delete(&mut conn, token).await?;
        Ok(())
    }

    /// All tokens registered for one user, exposed for push fan-out
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<DeviceToken>, AuthError> {
        let mut conn = self.get_conn().await?;
        Ok(DeviceToken::list_for_user(&mut conn, user_id).await?)
    }
}
