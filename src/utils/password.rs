// Password hashing and verification
// Two-step derivation: keyed HMAC-SHA-256 under a process-wide pepper,
// then bcrypt over the encoded tag. The pepper never reaches the database;
// bcrypt contributes the per-hash salt and cost factor.

use base64::Engine;
use ring::hmac;
use thiserror::Error;

/// Errors that can occur during password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingError(String),

    #[error("Failed to verify password: {0}")]
    VerificationError(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Derive the peppered input fed to bcrypt.
///
/// The raw HMAC tag is base64-encoded so the bcrypt input is printable and
/// stays well inside bcrypt's 72-byte limit (44 characters for a 32-byte tag).
fn pepper_password(password: &str, pepper: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, pepper.as_bytes());
    let tag = hmac::sign(&key, password.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(tag.as_ref())
}

/// Hash a password under the given pepper.
///
/// Returns the bcrypt hash in modular crypt format
/// (`$2b$<cost>$<salt+digest>`).
pub fn hash_password(password: &str, pepper: &str) -> Result<String, PasswordError> {
    let peppered = pepper_password(password, pepper);

    bcrypt::hash(peppered, bcrypt::DEFAULT_COST)
        .map_err(|e| PasswordError::HashingError(e.to_string()))
}

/// Verify a password against a stored hash under the given pepper.
///
/// A different pepper produces a different HMAC tag, so verification fails
/// even for the correct plaintext.
pub fn verify_password(password: &str, hash: &str, pepper: &str) -> Result<bool, PasswordError> {
    let peppered = pepper_password(password, pepper);

    match bcrypt::verify(peppered, hash) {
        Ok(matched) => Ok(matched),
        Err(bcrypt::BcryptError::InvalidHash(_)) => Err(PasswordError::InvalidHashFormat),
        Err(e) => Err(PasswordError::VerificationError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEPPER: &str = "test-pepper-secret-at-least-32-characters!!";

    #[test]
    fn test_hash_and_verify_password() {
        let password = "Passw0rd";

        let hash = hash_password(password, PEPPER).expect("Failed to hash password");

        // bcrypt modular crypt format
        assert!(hash.starts_with("$2"));

        assert!(verify_password(password, &hash, PEPPER).expect("Failed to verify password"));
        assert!(!verify_password("WrongPass1", &hash, PEPPER).expect("Failed to verify password"));
    }

    #[test]
    fn test_wrong_pepper_fails_verification() {
        let password = "Hunter42secret";
        let other_pepper = "another-pepper-secret-at-least-32-chars!!!!";

        let hash = hash_password(password, PEPPER).expect("Failed to hash password");

        assert!(verify_password(password, &hash, PEPPER).expect("Failed to verify"));
        assert!(!verify_password(password, &hash, other_pepper).expect("Failed to verify"));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = "SamePassword1";

        let hash1 = hash_password(password, PEPPER).expect("Failed to hash password");
        let hash2 = hash_password(password, PEPPER).expect("Failed to hash password");

        // bcrypt salts each hash independently
        assert_ne!(hash1, hash2);

        assert!(verify_password(password, &hash1, PEPPER).expect("Failed to verify"));
        assert!(verify_password(password, &hash2, PEPPER).expect("Failed to verify"));
    }

    #[test]
    fn test_long_password_does_not_truncate() {
        // Plaintext far beyond bcrypt's 72-byte input limit still round-trips
        // because only the fixed-size HMAC tag reaches bcrypt.
        let long_a = "a".repeat(100);
        let mut long_b = "a".repeat(99);
        long_b.push('b');

        let hash = hash_password(&long_a, PEPPER).expect("Failed to hash");

        assert!(verify_password(&long_a, &hash, PEPPER).expect("Failed to verify"));
        assert!(!verify_password(&long_b, &hash, PEPPER).expect("Failed to verify"));
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "not_a_valid_hash", PEPPER);
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }
}
