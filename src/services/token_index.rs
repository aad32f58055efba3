// Session revocation index backed by Redis
// Presence of a session identifier here is the authoritative signal that the
// corresponding JWT is live; entries self-expire with their token TTL.
//
// Key layout:
//   access:<jti>           -> user_id   (EX = access TTL)
//   refresh:<jti>          -> user_id   (EX = refresh TTL)
//   user_sessions:<user>   -> SET of the two key names above
//
// The reverse set exists solely so ban / password-change cascades can drop
// every identifier a user holds without scanning the keyspace.

use thiserror::Error;
use uuid::Uuid;

use crate::db::RedisPool;

const ACCESS_PREFIX: &str = "access:";
const REFRESH_PREFIX: &str = "refresh:";
const USER_SESSIONS_PREFIX: &str = "user_sessions:";

/// Errors for token index operations
#[derive(Error, Debug)]
pub enum TokenIndexError {
    /// The identifier is absent: revoked or expired
    #[error("Token not found in index")]
    NotFound,

    #[error("Token store error: {0}")]
    Store(String),
}

impl From<redis::RedisError> for TokenIndexError {
    fn from(e: redis::RedisError) -> Self {
        TokenIndexError::Store(e.to_string())
    }
}

/// Redis-backed session index
#[derive(Clone)]
pub struct TokenIndex {
    redis: RedisPool,
}

fn access_key(jti: &str) -> String {
    format!("{}{}", ACCESS_PREFIX, jti)
}

fn refresh_key(jti: &str) -> String {
    format!("{}{}", REFRESH_PREFIX, jti)
}

fn user_sessions_key(user_id: Uuid) -> String {
    format!("{}{}", USER_SESSIONS_PREFIX, user_id)
}

impl TokenIndex {
    pub fn new(redis: RedisPool) -> Self {
        Self { redis }
    }

    /// Store both identifiers of a freshly minted pair.
    ///
    /// Writes are atomic per identifier but NOT across the pair: a reader may
    /// briefly observe only one of the two. Verification tolerates this
    /// because access and refresh identifiers are queried independently.
    pub async fn store_session(
        &self,
        user_id: Uuid,
        access_id: &str,
        access_ttl: u64,
        refresh_id: &str,
        refresh_ttl: u64,
    ) -> Result<(), TokenIndexError> {
        let sessions_key = user_sessions_key(user_id);
        // The reverse set must outlive the longest-lived member
        let set_ttl = access_ttl.max(refresh_ttl);

        self.redis
            .set_with_expiry(&access_key(access_id), user_id.to_string(), access_ttl)
            .await?;
        self.redis
            .sadd_with_expiry(&sessions_key, access_key(access_id), set_ttl)
            .await?;

        self.redis
            .set_with_expiry(&refresh_key(refresh_id), user_id.to_string(), refresh_ttl)
            .await?;
        self.redis
            .sadd_with_expiry(&sessions_key, refresh_key(refresh_id), set_ttl)
            .await?;

        Ok(())
    }

    /// Resolve an access identifier to its user
    pub async fn user_by_access(&self, access_id: &str) -> Result<Uuid, TokenIndexError> {
        self.lookup(&access_key(access_id)).await
    }

    /// Resolve a refresh identifier to its user
    pub async fn user_by_refresh(&self, refresh_id: &str) -> Result<Uuid, TokenIndexError> {
        self.lookup(&refresh_key(refresh_id)).await
    }

    async fn lookup(&self, key: &str) -> Result<Uuid, TokenIndexError> {
        let value = self
            .redis
            .get(key)
            .await?
            .ok_or(TokenIndexError::NotFound)?;

        Uuid::parse_str(&value)
            .map_err(|_| TokenIndexError::Store(format!("corrupt index value under {}", key)))
    }

    /// Delete either or both identifiers. Returns the number of index
    /// entries actually removed; callers treating absence as success simply
    /// ignore a zero.
    pub async fn delete(
        &self,
        access_id: Option<&str>,
        refresh_id: Option<&str>,
    ) -> Result<u64, TokenIndexError> {
        let mut keys = Vec::new();
        if let Some(jti) = access_id {
            keys.push(access_key(jti));
        }
        if let Some(jti) = refresh_id {
            keys.push(refresh_key(jti));
        }
        if keys.is_empty() {
            return Ok(0);
        }

        // Unlink the reverse-set membership first; the set entry is only a
        // cascade hint, so a miss here is harmless.
        for key in &keys {
            if let Ok(Some(owner)) = self.redis.get(key).await {
                if let Ok(owner) = Uuid::parse_str(&owner) {
                    let _ = self
                        .redis
                        .srem(&user_sessions_key(owner), key.clone())
                        .await;
                }
            }
        }

        Ok(self.redis.del(&keys).await?)
    }

    /// Drop every live identifier for one user: both access and refresh
    /// entries, regardless of which session they belong to. Partial progress
    /// is acceptable; callers treat the whole operation as best-effort.
    pub async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, TokenIndexError> {
        let sessions_key = user_sessions_key(user_id);
        let members = self.redis.smembers(&sessions_key).await?;

        let mut deleted = 0u64;
        for member in &members {
            deleted += self.redis.del(std::slice::from_ref(member)).await?;
        }

        let _ = self.redis.del(&[sessions_key]).await?;
        Ok(deleted)
    }
}
