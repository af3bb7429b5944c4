/// Password Hashing and Verification
///
/// One-way salted hashing with bcrypt. The salt and cost live inside the
/// `$2b$...` blob, so verification only needs the blob and the candidate.
///
/// bcrypt only reads the first 72 bytes of its input. Longer passwords are
/// refused by `hash` and never match in `verify`, so two passwords sharing a
/// 72-byte prefix cannot stand in for each other.

use crate::error::{AppError, ConfigError, ValidationError};

/// Longest password bcrypt hashes without truncation, in bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// Outcome of checking a password against a stored hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordVerification {
    Match,
    Mismatch,
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Build a hasher for a configured work factor
    ///
    /// # Errors
    /// `ConfigError::InvalidValue` when the cost is outside bcrypt's 4..=31
    pub fn with_cost(cost: u32) -> Result<Self, ConfigError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(ConfigError::InvalidValue(format!(
                "password.hash_cost must be between {} and {}, got {}",
                MIN_COST, MAX_COST, cost
            )));
        }
        Ok(Self::new(cost))
    }

    /// Hash a password with a fresh random salt
    ///
    /// # Errors
    /// - `ValidationError::TooLong` for a password over 72 bytes
    /// - `AppError::Internal` if bcrypt rejects the cost or fails internally
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(
                ValidationError::TooLong("password".to_string(), MAX_PASSWORD_BYTES).into(),
            );
        }
        bcrypt::hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    ///
    /// A wrong password is `Mismatch`, not an error. Only a corrupt stored
    /// hash produces `Err`.
    pub fn verify(&self, hash: &str, password: &str) -> Result<PasswordVerification, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(PasswordVerification::Mismatch);
        }
        match bcrypt::verify(password, hash) {
            Ok(true) => Ok(PasswordVerification::Match),
            Ok(false) => Ok(PasswordVerification::Mismatch),
            Err(e) => Err(AppError::Internal(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_hash_password() {
        let password = "secret1";
        let hash = hasher().hash(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hasher().hash("secret1").expect("Failed to hash password");

        let result = hasher().verify(&hash, "secret1").expect("Failed to verify password");
        assert_eq!(result, PasswordVerification::Match);
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hasher().hash("secret1").expect("Failed to hash password");

        let result = hasher().verify(&hash, "secret2").expect("Failed to verify password");
        assert_eq!(result, PasswordVerification::Mismatch);
    }

    #[test]
    fn test_same_password_different_salts() {
        let first = hasher().hash("secret1").expect("Failed to hash password");
        let second = hasher().hash("secret1").expect("Failed to hash password");

        assert_ne!(first, second);
        assert_eq!(
            hasher().verify(&second, "secret1").unwrap(),
            PasswordVerification::Match
        );
    }

    #[test]
    fn test_corrupt_hash_is_an_error() {
        let result = hasher().verify("not-a-bcrypt-hash", "secret1");
        assert!(result.is_err());
    }

    #[test]
    fn test_passwords_sharing_a_72_byte_prefix_do_not_match() {
        let prefix = "a".repeat(MAX_PASSWORD_BYTES);
        let hash = hasher().hash(&prefix).expect("Failed to hash password");

        let longer = format!("{}WRONG", prefix);
        let result = hasher().verify(&hash, &longer).expect("Failed to verify password");
        assert_eq!(result, PasswordVerification::Mismatch);
    }

    #[test]
    fn test_hash_refuses_passwords_over_72_bytes() {
        let too_long = format!("{}correct-suffix", "a".repeat(MAX_PASSWORD_BYTES));
        let result = hasher().hash(&too_long);

        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::TooLong(_, MAX_PASSWORD_BYTES)))
        ));
    }

    #[test]
    fn test_multibyte_password_limit_counts_bytes() {
        // 36 two-byte characters fill the limit exactly
        let at_limit = "é".repeat(36);
        assert!(hasher().hash(&at_limit).is_ok());
        assert!(hasher().hash(&"é".repeat(37)).is_err());
    }

    #[test]
    fn test_with_cost_rejects_out_of_range_values() {
        assert!(PasswordHasher::with_cost(4).is_ok());
        assert!(PasswordHasher::with_cost(31).is_ok());
        assert!(matches!(
            PasswordHasher::with_cost(3),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            PasswordHasher::with_cost(32),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
