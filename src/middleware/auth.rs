// Principal context injected into request extensions by the policy gates

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated end user, extracted from a verified access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    /// The access token's `jti`; logout needs it to revoke the session
    pub access_id: String,
    pub roles: Vec<String>,
}

/// Subject injected into internal callers when the static shared secret is
/// presented instead of an inter-service JWT
pub const STATIC_SECRET_SUBJECT: &str = "_static_secret_";

/// Internal caller admitted by the inter-service gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalCaller {
    /// Name of the calling service, or `_static_secret_` for the bootstrap
    /// bypass
    pub service: String,
}

impl InternalCaller {
    pub fn is_static_secret(&self) -> bool {
        self.service == STATIC_SECRET_SUBJECT
    }
}
