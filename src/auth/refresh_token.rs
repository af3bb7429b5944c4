/// Refresh Token Generation
///
/// Refresh tokens are opaque: 32 bytes from a cryptographically secure
/// source, base64 encoded. Nothing about them is derived from the user, the
/// time, or earlier tokens.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::domain::StoredRefreshToken;

/// Number of random bytes in a refresh token
pub const REFRESH_TOKEN_BYTES: usize = 32;
/// Lifetime of a refresh token
pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 7;

/// Source of secure random bytes
pub trait RandomSource: Send + Sync {
    fn fill(&self, dest: &mut [u8]);
}

/// Operating system CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}

#[derive(Clone)]
pub struct RefreshTokenGenerator {
    random: Arc<dyn RandomSource>,
}

impl Default for RefreshTokenGenerator {
    fn default() -> Self {
        Self::new(Arc::new(OsRandom))
    }
}

impl RefreshTokenGenerator {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Generate a new opaque refresh token
    pub fn generate(&self) -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        self.random.fill(&mut bytes);
        STANDARD.encode(bytes)
    }

    /// Generate a token together with its expiry, seven days after `now`
    pub fn issue(&self, now: DateTime<Utc>) -> StoredRefreshToken {
        StoredRefreshToken {
            token: self.generate(),
            expires_at: now + Duration::days(REFRESH_TOKEN_LIFETIME_DAYS),
        }
    }
}
