// JWT issuance and parsing with HS256
// User tokens (access + refresh) share one secret; inter-service tokens are
// signed with a distinct secret and carry no revocation index entry.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{InterServiceClaims, UserClaims};

// Error taxonomy for JWT parsing. Downstream code distinguishes exactly
// these kinds: expiry, malformed input, and everything signature-shaped.
#[derive(Error, Debug, PartialEq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Token malformed")]
    Malformed,

    #[error("Token invalid")]
    Invalid,

    #[error("Token signing error: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed,
            // Wrong signing method and bad signatures collapse into one kind
            _ => TokenError::Invalid,
        }
    }
}

/// Token signing configuration with separate keys for user and
/// inter-service tokens
#[derive(Clone)]
pub struct TokenConfig {
    pub access_token_ttl: u64,
    pub refresh_token_ttl: u64,
    pub inter_service_token_ttl: u64,
    pub algorithm: Algorithm,
    pub issuer: String,

    pub user_encoding_key: EncodingKey,
    pub user_decoding_key: DecodingKey,

    pub inter_service_encoding_key: EncodingKey,
    pub inter_service_decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("inter_service_token_ttl", &self.inter_service_token_ttl)
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("user_encoding_key", &"<redacted>")
            .field("user_decoding_key", &"<redacted>")
            .field("inter_service_encoding_key", &"<redacted>")
            .field("inter_service_decoding_key", &"<redacted>")
            .finish()
    }
}

impl TokenConfig {
    /// Build token config from raw secrets and TTLs
    pub fn from_secrets(
        jwt_secret: &str,
        inter_service_secret: &str,
        access_token_ttl: u64,
        refresh_token_ttl: u64,
        inter_service_token_ttl: u64,
        issuer: String,
    ) -> Self {
        TokenConfig {
            access_token_ttl,
            refresh_token_ttl,
            inter_service_token_ttl,
            algorithm: Algorithm::HS256,
            issuer,
            user_encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            user_decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            inter_service_encoding_key: EncodingKey::from_secret(inter_service_secret.as_bytes()),
            inter_service_decoding_key: DecodingKey::from_secret(inter_service_secret.as_bytes()),
        }
    }

    /// Create token config from centralized app configuration
    pub fn from_env() -> Self {
        let tokens = &crate::app_config::config().tokens;
        Self::from_secrets(
            &tokens.jwt_secret,
            &tokens.inter_service_secret,
            tokens.access_token_ttl,
            tokens.refresh_token_ttl,
            tokens.inter_service_token_ttl,
            tokens.service_id.clone(),
        )
    }
}

/// The freshly minted access/refresh pair together with the session
/// identifiers and absolute expiry timestamps handed back to clients
#[derive(Debug, Clone, Serialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub access_id: String,
    pub refresh_id: String,
    pub access_expires_at: u64,
    pub refresh_expires_at: u64,
}

/// Stateless JWT service: signing and parsing only. Revocation lookups and
/// user checks are composed on top by the verifier and session service.
pub struct TokenService {
    config: TokenConfig,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(TokenConfig::from_env())
    }

    pub fn access_token_ttl(&self) -> u64 {
        self.config.access_token_ttl
    }

    pub fn refresh_token_ttl(&self) -> u64 {
        self.config.refresh_token_ttl
    }

    fn now() -> Result<u64, TokenError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Sign one user JWT carrying the session identifier as `jti`
    fn generate_user_token(
        &self,
        user_id: Uuid,
        roles: &[String],
        jti: &str,
        ttl: u64,
    ) -> Result<(String, u64), TokenError> {
        let now = Self::now()?;
        let expires_at = now + ttl;

        let claims = UserClaims {
            sub: user_id.to_string(),
            jti: jti.to_string(),
            roles: roles.to_vec(),
            iss: self.config.issuer.clone(),
            iat: now,
            exp: expires_at,
        };

        let header = Header::new(self.config.algorithm);
        let token = encode(&header, &claims, &self.config.user_encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok((token, expires_at))
    }

    /// Mint a fresh access/refresh pair. Identifiers are random UUIDs
    /// generated per issuance; persisting them in the index is the caller's
    /// responsibility.
    pub fn issue_session(
        &self,
        user_id: Uuid,
        roles: &[String],
    ) -> Result<SessionTokens, TokenError> {
        let access_id = Uuid::new_v4().to_string();
        let refresh_id = Uuid::new_v4().to_string();

        let (access_token, access_expires_at) =
            self.generate_user_token(user_id, roles, &access_id, self.config.access_token_ttl)?;
        let (refresh_token, refresh_expires_at) =
            self.generate_user_token(user_id, roles, &refresh_id, self.config.refresh_token_ttl)?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
            access_id,
            refresh_id,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Parse and verify a user JWT: HS256 only, signature, expiry.
    /// The revocation index is NOT consulted here.
    pub fn decode_user_token(&self, token: &str) -> Result<UserClaims, TokenError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let token_data =
            decode::<UserClaims>(token, &self.config.user_decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    /// Extract claims without verifying the signature or expiry. Logout uses
    /// this: index presence, not the signature, is the source of truth there.
    pub fn parse_user_claims_unverified(&self, token: &str) -> Result<UserClaims, TokenError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;

        let token_data =
            decode::<UserClaims>(token, &self.config.user_decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    /// Sign an inter-service JWT whose subject names the requesting service
    pub fn generate_inter_service_token(&self, service_name: &str) -> Result<String, TokenError> {
        let now = Self::now()?;

        let claims = InterServiceClaims {
            sub: service_name.to_string(),
            iss: self.config.issuer.clone(),
            iat: now,
            exp: now + self.config.inter_service_token_ttl,
        };

        let header = Header::new(self.config.algorithm);
        encode(&header, &claims, &self.config.inter_service_encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Parse and verify an inter-service JWT. Stateless: validity follows
    /// from signature and expiry alone.
    pub fn decode_inter_service_token(
        &self,
        token: &str,
    ) -> Result<InterServiceClaims, TokenError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let token_data = decode::<InterServiceClaims>(
            token,
            &self.config.inter_service_decoding_key,
            &validation,
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{ROLE_ADMIN, ROLE_USER};

    fn test_service() -> TokenService {
        TokenService::new(TokenConfig::from_secrets(
            "test-user-secret-hs256-minimum-32-characters!",
            "test-inter-service-secret-minimum-32-chars!!",
            3600,
            604800,
            3600,
            "story-auth-test".to_string(),
        ))
    }

    #[test]
    fn test_issue_session_round_trip() {
        let service = test_service();
        let user_id = Uuid::new_v4();
        let roles = vec![ROLE_USER.to_string()];

        let pair = service.issue_session(user_id, &roles).unwrap();

        assert_ne!(pair.access_id, pair.refresh_id);
        assert!(pair.refresh_expires_at > pair.access_expires_at);

        let access = service.decode_user_token(&pair.access_token).unwrap();
        assert_eq!(access.sub, user_id.to_string());
        assert_eq!(access.jti, pair.access_id);
        assert_eq!(access.roles, roles);
        assert_eq!(access.iss, "story-auth-test");

        let refresh = service.decode_user_token(&pair.refresh_token).unwrap();
        assert_eq!(refresh.jti, pair.refresh_id);
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let service = test_service();
        let other = TokenService::new(TokenConfig::from_secrets(
            "a-completely-different-user-secret-32-chars!!",
            "a-completely-different-svc-secret-32-chars!!",
            3600,
            604800,
            3600,
            "story-auth-test".to_string(),
        ));

        let pair = service
            .issue_session(Uuid::new_v4(), &[ROLE_USER.to_string()])
            .unwrap();

        assert_eq!(
            other.decode_user_token(&pair.access_token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_user_token_does_not_verify_as_inter_service() {
        let service = test_service();
        let pair = service
            .issue_session(Uuid::new_v4(), &[ROLE_USER.to_string()])
            .unwrap();

        // Different secret, and the claims shapes differ too
        assert!(service
            .decode_inter_service_token(&pair.access_token)
            .is_err());
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = test_service();
        assert_eq!(
            service.decode_user_token("definitely-not-a-jwt"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_expired_token() {
        let service = TokenService::new(TokenConfig::from_secrets(
            "test-user-secret-hs256-minimum-32-characters!",
            "test-inter-service-secret-minimum-32-chars!!",
            0, // already expired at issuance
            0,
            0,
            "story-auth-test".to_string(),
        ));

        let pair = service
            .issue_session(Uuid::new_v4(), &[ROLE_USER.to_string()])
            .unwrap();

        // leeway is zero, so an exp equal to `now` fails the check
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(
            service.decode_user_token(&pair.access_token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_unverified_parse_ignores_signature_and_expiry() {
        let service = test_service();
        let other = TokenService::new(TokenConfig::from_secrets(
            "a-completely-different-user-secret-32-chars!!",
            "a-completely-different-svc-secret-32-chars!!",
            3600,
            604800,
            3600,
            "story-auth-test".to_string(),
        ));

        let pair = service
            .issue_session(Uuid::new_v4(), &[ROLE_USER.to_string()])
            .unwrap();

        // Signed by `service`, parsed by `other`: jti still comes out
        let claims = other
            .parse_user_claims_unverified(&pair.refresh_token)
            .unwrap();
        assert_eq!(claims.jti, pair.refresh_id);
    }

    #[test]
    fn test_inter_service_round_trip() {
        let service = test_service();

        let token = service.generate_inter_service_token("gameplay").unwrap();
        let claims = service.decode_inter_service_token(&token).unwrap();

        assert_eq!(claims.sub, "gameplay");
        assert_eq!(claims.iss, "story-auth-test");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_admin_roles_survive_issuance() {
        let service = test_service();
        let roles = vec![ROLE_USER.to_string(), ROLE_ADMIN.to_string()];

        let pair = service.issue_session(Uuid::new_v4(), &roles).unwrap();
        let claims = service.decode_user_token(&pair.access_token).unwrap();

        assert!(claims.is_admin());
    }
}
