// Registration input validation and normalisation rules

use lazy_static::lazy_static;
use regex::Regex;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 100;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// Username: length in [3, 30], alphanumerics plus `_` and `-`
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN || len > USERNAME_MAX_LEN {
        return Err(format!(
            "username must be between {} and {} characters",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(
            "username may only contain letters, digits, underscores and hyphens".to_string(),
        );
    }
    Ok(())
}

/// Password: length in [8, 100], at least one letter and one digit
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN || len > PASSWORD_MAX_LEN {
        return Err(format!(
            "password must be between {} and {} characters",
            PASSWORD_MIN_LEN, PASSWORD_MAX_LEN
        ));
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_letter || !has_digit {
        return Err("password must contain at least one letter and one digit".to_string());
    }
    Ok(())
}

/// Email must parse as a mailbox address. Validate the normalised form so
/// that surrounding whitespace never reaches the check.
pub fn validate_email(email: &str) -> Result<(), String> {
    let normalized = normalize_email(email);
    if !validator::validate_email(&normalized) {
        return Err("invalid email address".to_string());
    }
    Ok(())
}

/// Canonical stored form: trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_length_boundaries() {
        assert!(validate_username("ab").is_err()); // 2
        assert!(validate_username("abc").is_ok()); // 3
        assert!(validate_username(&"a".repeat(30)).is_ok()); // 30
        assert!(validate_username(&"a".repeat(31)).is_err()); // 31
    }

    #[test]
    fn test_username_charset() {
        assert!(validate_username("story_reader-42").is_ok());
        assert!(validate_username("bad space").is_err());
        assert!(validate_username("émile").is_err());
        assert!(validate_username("semi;colon").is_err());
    }

    #[test]
    fn test_password_boundaries() {
        assert!(validate_password_strength("abc123d").is_err()); // 7
        assert!(validate_password_strength("abc123de").is_ok()); // 8 with both
        assert!(validate_password_strength("abcdefgh").is_err()); // missing digit
        assert!(validate_password_strength("12345678").is_err()); // missing letter
        assert!(validate_password_strength(&format!("a1{}", "x".repeat(98))).is_ok()); // 100
        assert!(validate_password_strength(&format!("a1{}", "x".repeat(99))).is_err()); // 101
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("foo").is_err());
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("  padded@example.com  ").is_ok());
        assert!(validate_email("no-at-sign.example.com").is_err());
    }

    #[test]
    fn test_email_normalization() {
        assert_eq!(normalize_email("  Alice@X.IO "), "alice@x.io");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }
}
