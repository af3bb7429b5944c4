/// Authentication module
///
/// Password hashing, access token signing/verification and refresh token
/// generation. The orchestration lives in `crate::service`.

mod claims;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{Claims, ACCESS_TOKEN_LIFETIME_HOURS};
pub use jwt::{TokenSigner, TokenVerifier};
pub use password::{PasswordHasher, PasswordVerification, MAX_PASSWORD_BYTES};
pub use refresh_token::{
    OsRandom, RandomSource, RefreshTokenGenerator, REFRESH_TOKEN_BYTES,
    REFRESH_TOKEN_LIFETIME_DAYS,
};
