// User database model
// Canonical identity record: credentials, roles, ban flag, display attributes

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::users;

/// Baseline role granted to every account at registration
pub const ROLE_USER: &str = "user";
/// Role required by the admin refresh flow and the admin gate
pub const ROLE_ADMIN: &str = "admin";

/// User database model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub roles: Vec<String>,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user for insertion
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub roles: Vec<String>,
}

/// Partial update of mutable user attributes; None fields are left untouched
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
    pub is_banned: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self {
            email: None,
            roles: None,
            is_banned: None,
            updated_at: Utc::now(),
        }
    }
}

/// Errors for user operations
#[derive(thiserror::Error, Debug)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("User not found")]
    NotFound,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already taken")]
    EmailTaken,

    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl UserError {
    /// Map insert-time unique violations to the distinct conflict kinds
    fn from_insert_error(e: diesel::result::Error) -> Self {
        if let diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) =
            e
        {
            match info.constraint_name() {
                Some(name) if name.contains("username") => return UserError::UsernameTaken,
                Some(name) if name.contains("email") => return UserError::EmailTaken,
                _ => {},
            }
        }
        UserError::Database(e)
    }
}

/// Opaque forward-only cursor over `(created_at DESC, id DESC)`
#[derive(Debug, Clone, PartialEq)]
pub struct UserCursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl UserCursor {
    /// Encode as an opaque token handed to API callers
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.created_at.timestamp_micros(), self.id);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw)
    }

    /// Decode a caller-supplied cursor; any corruption is a decode failure
    pub fn decode(token: &str) -> Option<Self> {
        let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .ok()?;
        let raw = String::from_utf8(raw).ok()?;
        let (micros, id) = raw.split_once(':')?;
        let micros: i64 = micros.parse().ok()?;
        let created_at = Utc.timestamp_micros(micros).single()?;
        let id = Uuid::parse_str(id).ok()?;
        Some(Self { created_at, id })
    }
}

impl User {
    /// Find user by ID
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        users
            .filter(id.eq(user_id))
            .first::<User>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => UserError::NotFound,
                _ => UserError::Database(e),
            })
    }

    /// Find user by username (case-insensitive; stored form preserves case)
    pub async fn find_by_username(
        conn: &mut AsyncPgConnection,
        username_str: &str,
    ) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;
        use diesel::PgTextExpressionMethods;

        users
            .filter(username.ilike(username_str))
            .first::<User>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => UserError::NotFound,
                _ => UserError::Database(e),
            })
    }

    /// Find user by normalised email
    pub async fn find_by_email(
        conn: &mut AsyncPgConnection,
        email_str: &str,
    ) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        users
            .filter(email.eq(email_str))
            .first::<User>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => UserError::NotFound,
                _ => UserError::Database(e),
            })
    }

    /// Create a new user; unique violations surface as the distinct
    /// username/email conflict kinds
    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_user: NewUser,
    ) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        diesel::insert_into(users)
            .values(&new_user)
            .get_result::<User>(conn)
            .await
            .map_err(UserError::from_insert_error)
    }

    /// Keyset-paginated listing, newest first. Returns up to `limit` users;
    /// the caller derives the next cursor from the last row.
    pub async fn list(
        conn: &mut AsyncPgConnection,
        cursor: Option<UserCursor>,
        limit: i64,
    ) -> Result<Vec<Self>, UserError> {
        use crate::schema::users::dsl::*;

        let mut query = users
            .order((created_at.desc(), id.desc()))
            .limit(limit)
            .into_boxed();

        if let Some(c) = cursor {
            query = query.filter(
                created_at
                    .lt(c.created_at)
                    .or(created_at.eq(c.created_at).and(id.lt(c.id))),
            );
        }

        query
            .load::<User>(conn)
            .await
            .map_err(UserError::Database)
    }

    /// Total number of registered users
    pub async fn count(conn: &mut AsyncPgConnection) -> Result<i64, UserError> {
        use crate::schema::users::dsl::*;

        users
            .count()
            .get_result::<i64>(conn)
            .await
            .map_err(UserError::Database)
    }

    /// Set the ban flag. Idempotent: setting an already-set flag is a no-op
    /// at the row level.
    pub async fn set_banned(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        banned: bool,
    ) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        diesel::update(users.filter(id.eq(user_id)))
            .set((is_banned.eq(banned), updated_at.eq(Utc::now())))
            .get_result::<User>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => UserError::NotFound,
                _ => UserError::Database(e),
            })
    }

    /// Apply a partial update; email uniqueness conflicts map to EmailTaken
    pub async fn update_fields(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        update: UserUpdate,
    ) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        diesel::update(users.filter(id.eq(user_id)))
            .set(&update)
            .get_result::<User>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => UserError::NotFound,
                _ => UserError::from_insert_error(e),
            })
    }

    /// Replace the stored password hash
    pub async fn update_password_hash(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        new_hash: &str,
    ) -> Result<(), UserError> {
        use crate::schema::users::dsl::*;

        let updated = diesel::update(users.filter(id.eq(user_id)))
            .set((password_hash.eq(new_hash), updated_at.eq(Utc::now())))
            .execute(conn)
            .await
            .map_err(UserError::Database)?;

        if updated == 0 {
            return Err(UserError::NotFound);
        }
        Ok(())
    }

    /// Check membership of a role tag
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Admin-console eligibility
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(roles: Vec<&str>, banned: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "reader_one".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: "hash".to_string(),
            display_name: "Reader One".to_string(),
            roles: roles.into_iter().map(String::from).collect(),
            is_banned: banned,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_role_membership() {
        let user = sample_user(vec![ROLE_USER], false);
        assert!(user.has_role(ROLE_USER));
        assert!(!user.is_admin());

        let admin = sample_user(vec![ROLE_USER, ROLE_ADMIN], false);
        assert!(admin.is_admin());
    }

    #[test]
    fn test_cursor_round_trip() {
        let cursor = UserCursor {
            created_at: Utc.timestamp_micros(1_700_000_000_123_456).single().unwrap(),
            id: Uuid::new_v4(),
        };

        let token = cursor.encode();
        let decoded = UserCursor::decode(&token).expect("cursor should decode");
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!(UserCursor::decode("not-base64!!!").is_none());

        let bogus = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("no-colon-here");
        assert!(UserCursor::decode(&bogus).is_none());

        let bad_uuid = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("123:not-a-uuid");
        assert!(UserCursor::decode(&bad_uuid).is_none());
    }
}
