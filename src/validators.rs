/// Input validators for the HTTP boundary
///
/// Malformed input is rejected here, before it reaches the auth service:
/// 1. Length limits (DoS protection, bcrypt input size)
/// 2. Email format
/// 3. Control characters in display names

use regex::Regex;
use lazy_static::lazy_static;

use crate::auth::MAX_PASSWORD_BYTES;
use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 3;
const MAX_NAME_LENGTH: usize = 256;
const MIN_PASSWORD_LENGTH: usize = 6;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address and returns it trimmed
///
/// Case is preserved: emails are matched exactly as stored.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a display name and returns it trimmed
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("name".to_string()));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("name".to_string(), MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("name".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates password length; the password itself is never trimmed
///
/// The upper bound is in bytes since that is what bcrypt consumes.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password".to_string(), MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_BYTES));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
        assert_eq!(is_valid_email("  ann@x.com ").unwrap(), "ann@x.com");
    }

    #[test]
    fn test_email_case_is_preserved() {
        assert_eq!(is_valid_email("Ann@X.com").unwrap(), "Ann@X.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
        assert!(is_valid_email("").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("Ann").is_ok());
        assert!(is_valid_name("Jean-Pierre").is_ok());
        assert!(is_valid_name("O'Brien").is_ok());
    }

    #[test]
    fn test_invalid_name() {
        assert!(is_valid_name("").is_err());
        assert!(is_valid_name("   ").is_err());
        assert!(is_valid_name(&"a".repeat(257)).is_err());
        assert!(is_valid_name("Name\0with\0null").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(is_valid_password("secret1").is_ok());
        assert!(is_valid_password("123456").is_ok());
        assert_eq!(
            is_valid_password("12345"),
            Err(ValidationError::TooShort("password".to_string(), 6))
        );
        assert!(is_valid_password(&"a".repeat(72)).is_ok());
        assert!(is_valid_password("").is_err());
    }

    #[test]
    fn test_password_longer_than_bcrypt_input_is_rejected() {
        let prefix = "a".repeat(72);
        assert_eq!(
            is_valid_password(&format!("{}correct-suffix", prefix)),
            Err(ValidationError::TooLong("password".to_string(), 72))
        );
        assert!(is_valid_password(&format!("{}WRONG", prefix)).is_err());
        // 40 three-byte characters are 120 bytes
        assert!(is_valid_password(&"€".repeat(40)).is_err());
    }
}
