// JWT claims structures for user and inter-service tokens

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::ROLE_ADMIN;

/// Claims carried by both access and refresh user tokens.
/// `jti` is the session identifier keyed in the revocation index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserClaims {
    /// User ID (subject), canonical UUID in string form
    pub sub: String,

    /// Session identifier for revocation (UUID format)
    pub jti: String,

    /// Role tags granted to the user at issuance time
    pub roles: Vec<String>,

    /// Issuer (the SERVICE_ID of this auth service)
    pub iss: String,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: u64,

    /// Expires at timestamp (Unix epoch seconds)
    pub exp: u64,
}

impl UserClaims {
    /// Parse the subject back into the canonical UUID form
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }
}

/// Claims carried by inter-service tokens. Stateless: no revocation index
/// entry exists for these, validity follows from signature and expiry alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterServiceClaims {
    /// Name of the calling service (subject)
    pub sub: String,

    /// Issuer (the SERVICE_ID of this auth service)
    pub iss: String,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: u64,

    /// Expires at timestamp (Unix epoch seconds)
    pub exp: u64,
}
