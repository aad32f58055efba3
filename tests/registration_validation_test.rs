// Registration input boundary tests

use story_auth_core::utils::validation::{
    normalize_email, validate_email, validate_password_strength, validate_username,
};

#[test]
fn test_username_boundaries() {
    // 2 / 3 / 30 / 31
    assert!(validate_username("ab").is_err());
    assert!(validate_username("abc").is_ok());
    assert!(validate_username(&"x".repeat(30)).is_ok());
    assert!(validate_username(&"x".repeat(31)).is_err());
}

#[test]
fn test_username_pattern() {
    assert!(validate_username("alice").is_ok());
    assert!(validate_username("alice_2-b").is_ok());
    assert!(validate_username("alice!").is_err());
    assert!(validate_username("ali ce").is_err());
    assert!(validate_username("alice@x").is_err());
}

#[test]
fn test_password_boundaries() {
    // missing digit / missing letter / length 7 / length 8 with both
    assert!(validate_password_strength("abcdefgh").is_err());
    assert!(validate_password_strength("12345678").is_err());
    assert!(validate_password_strength("abc1234").is_err());
    assert!(validate_password_strength("abcd1234").is_ok());
}

#[test]
fn test_email_forms() {
    assert!(validate_email("foo").is_err());
    assert!(validate_email("a@b.co").is_ok());
    // Surrounding whitespace is stripped before the check
    assert!(validate_email("  a@b.co  ").is_ok());
}

#[test]
fn test_email_case_folding_and_trim() {
    assert_eq!(normalize_email(" Foo@Bar.COM "), "foo@bar.com");
}
