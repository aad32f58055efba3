// Device token database model
// Per-user (platform, token) registry consumed by push fan-out

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::schema::user_device_tokens;

/// Supported push platforms
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(format!("Invalid platform: {}", other)),
        }
    }
}

/// Device token database model
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = user_device_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeviceToken {
    pub token: String,
    pub user_id: Uuid,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

/// New device token for insertion
#[derive(Debug, Insertable)]
#[diesel(table_name = user_device_tokens)]
pub struct NewDeviceToken {
    pub token: String,
    pub user_id: Uuid,
    pub platform: String,
}

/// Errors for device token operations
#[derive(thiserror::Error, Debug)]
pub enum DeviceTokenError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl DeviceToken {
    /// Upsert by token string: a token re-registered by another user (or
    /// after a platform switch) is reassigned rather than duplicated.
    pub async fn save(
        conn: &mut AsyncPgConnection,
        new_token: NewDeviceToken,
    ) -> Result<Self, DeviceTokenError> {
        use crate::schema::user_device_tokens::dsl::*;

        diesel::insert_into(user_device_tokens)
            .values(&new_token)
            .on_conflict(token)
            .do_update()
            .set((
                user_id.eq(&new_token.user_id),
                platform.eq(&new_token.platform),
            ))
            .get_result::<DeviceToken>(conn)
            .await
            .map_err(DeviceTokenError::Database)
    }

    /// Delete by token string; missing tokens are not an error
    pub async fn delete(
        conn: &mut AsyncPgConnection,
        token_str: &str,
    ) -> Result<usize, DeviceTokenError> {
        use crate::schema::user_device_tokens::dsl::*;

        diesel::delete(user_device_tokens.filter(token.eq(token_str)))
            .execute(conn)
            .await
            .map_err(DeviceTokenError::Database)
    }

    /// All tokens registered for one user, oldest first
    pub async fn list_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
    ) -> Result<Vec<Self>, DeviceTokenError> {
        use crate::schema::user_device_tokens::dsl::*;

        user_device_tokens
            .filter(user_id.eq(owner))
            .order(created_at.asc())
            .load::<DeviceToken>(conn)
            .await
            .map_err(DeviceTokenError::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parsing() {
        assert_eq!("android".parse::<Platform>(), Ok(Platform::Android));
        assert_eq!("IOS".parse::<Platform>(), Ok(Platform::Ios));
        assert_eq!("Android".parse::<Platform>(), Ok(Platform::Android));
        assert!("windows".parse::<Platform>().is_err());
        assert!("".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_as_str() {
        assert_eq!(Platform::Android.as_str(), "android");
        assert_eq!(Platform::Ios.as_str(), "ios");
    }
}
