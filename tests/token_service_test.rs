// Token signing and parsing tests without database dependencies

use base64::Engine;
use story_auth_core::{TokenConfig, TokenError, TokenService, ROLE_ADMIN, ROLE_USER};
use uuid::Uuid;

const USER_SECRET: &str = "test-user-secret-hs256-minimum-32-characters!";
const SERVICE_SECRET: &str = "test-inter-service-secret-minimum-32-chars!!";

/// Helper to create a token service without relying on environment
fn create_test_token_service() -> TokenService {
    TokenService::new(TokenConfig::from_secrets(
        USER_SECRET,
        SERVICE_SECRET,
        3600,   // 1 hour
        604800, // 7 days
        3600,
        "story-auth-test".to_string(),
    ))
}

#[test]
fn test_session_issuance_and_validation() {
    let service = create_test_token_service();
    let user_id = Uuid::new_v4();
    let roles = vec![ROLE_USER.to_string()];

    let pair = service
        .issue_session(user_id, &roles)
        .expect("Failed to issue session");

    // Identifiers are fresh UUIDs, one per token
    assert_ne!(pair.access_id, pair.refresh_id);
    Uuid::parse_str(&pair.access_id).expect("access_id should be a UUID");
    Uuid::parse_str(&pair.refresh_id).expect("refresh_id should be a UUID");

    let access = service
        .decode_user_token(&pair.access_token)
        .expect("Failed to validate access token");
    assert_eq!(access.sub, user_id.to_string());
    assert_eq!(access.jti, pair.access_id);
    assert_eq!(access.roles, roles);
    assert_eq!(access.exp, pair.access_expires_at);

    let refresh = service
        .decode_user_token(&pair.refresh_token)
        .expect("Failed to validate refresh token");
    assert_eq!(refresh.jti, pair.refresh_id);
    assert_eq!(refresh.exp, pair.refresh_expires_at);
}

#[test]
fn test_malformed_token_is_rejected() {
    let service = create_test_token_service();

    assert_eq!(
        service.decode_user_token("not-a-jwt"),
        Err(TokenError::Malformed)
    );
    assert_eq!(
        service.decode_user_token("a.b"),
        Err(TokenError::Malformed)
    );
}

#[test]
fn test_wrong_signature_is_invalid() {
    let service = create_test_token_service();
    let other = TokenService::new(TokenConfig::from_secrets(
        "another-user-secret-with-enough-characters!!!",
        "another-service-secret-with-enough-chars!!!!!",
        3600,
        604800,
        3600,
        "story-auth-test".to_string(),
    ));

    let pair = other
        .issue_session(Uuid::new_v4(), &[ROLE_USER.to_string()])
        .unwrap();

    assert_eq!(
        service.decode_user_token(&pair.access_token),
        Err(TokenError::Invalid)
    );
}

/// Build a token with a forged header but the payload/signature of a real one
fn with_forged_alg(token: &str, alg: &str) -> String {
    let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(format!(r#"{{"typ":"JWT","alg":"{}"}}"#, alg));
    let mut parts = token.split('.');
    let _ = parts.next();
    let payload = parts.next().expect("payload");
    let signature = parts.next().expect("signature");
    format!("{}.{}.{}", header, payload, signature)
}

#[test]
fn test_wrong_signing_method_is_invalid() {
    let service = create_test_token_service();
    let pair = service
        .issue_session(Uuid::new_v4(), &[ROLE_USER.to_string()])
        .unwrap();

    // HS256 is required; RS256 and the unsigned "none" are both rejected
    let rs256 = with_forged_alg(&pair.access_token, "RS256");
    assert_eq!(service.decode_user_token(&rs256), Err(TokenError::Invalid));

    let none = with_forged_alg(&pair.access_token, "none");
    assert_eq!(service.decode_user_token(&none), Err(TokenError::Invalid));
}

#[tokio::test]
async fn test_token_expiry() {
    let service = TokenService::new(TokenConfig::from_secrets(
        USER_SECRET,
        SERVICE_SECRET,
        1, // 1 second expiry
        1,
        1,
        "story-auth-test".to_string(),
    ));

    let pair = service
        .issue_session(Uuid::new_v4(), &[ROLE_USER.to_string()])
        .unwrap();

    assert!(service.decode_user_token(&pair.access_token).is_ok());

    tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;

    assert_eq!(
        service.decode_user_token(&pair.access_token),
        Err(TokenError::Expired)
    );
}

#[test]
fn test_unverified_parse_for_logout() {
    let service = create_test_token_service();
    let pair = service
        .issue_session(Uuid::new_v4(), &[ROLE_USER.to_string()])
        .unwrap();

    // Corrupt the signature: verified decode refuses, unverified parse
    // still yields the jti (index presence is the source of truth there)
    let mut broken = pair.refresh_token.clone();
    broken.truncate(broken.len() - 4);
    broken.push_str("AAAA");

    assert!(service.decode_user_token(&broken).is_err());

    let claims = service
        .parse_user_claims_unverified(&broken)
        .expect("unverified parse should succeed");
    assert_eq!(claims.jti, pair.refresh_id);
}

#[test]
fn test_inter_service_token_round_trip() {
    let service = create_test_token_service();

    let token = service
        .generate_inter_service_token("gameplay")
        .expect("Failed to generate inter-service token");

    let claims = service
        .decode_inter_service_token(&token)
        .expect("Failed to validate inter-service token");

    assert_eq!(claims.sub, "gameplay");
    assert_eq!(claims.iss, "story-auth-test");
}

#[test]
fn test_secrets_are_not_interchangeable() {
    let service = create_test_token_service();

    // A user token never verifies under the inter-service secret and
    // vice versa
    let pair = service
        .issue_session(Uuid::new_v4(), &[ROLE_USER.to_string()])
        .unwrap();
    assert!(service
        .decode_inter_service_token(&pair.access_token)
        .is_err());

    let service_token = service.generate_inter_service_token("gameplay").unwrap();
    assert!(service.decode_user_token(&service_token).is_err());
}

#[test]
fn test_roles_carried_in_claims() {
    let service = create_test_token_service();
    let roles = vec![ROLE_USER.to_string(), ROLE_ADMIN.to_string()];

    let pair = service.issue_session(Uuid::new_v4(), &roles).unwrap();

    let claims = service.decode_user_token(&pair.access_token).unwrap();
    assert!(claims.is_admin());
    assert_eq!(claims.roles, roles);
}
