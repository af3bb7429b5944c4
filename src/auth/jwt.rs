/// Access token signing and verification
///
/// Tokens are HS512 JWTs. The signer is built once at startup and refuses to
/// exist without a secret; the verifier is what the HTTP boundary uses to
/// authenticate bearer tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::domain::Role;
use crate::error::{AppError, AuthError, ConfigError};

const MIN_RECOMMENDED_SECRET_BYTES: usize = 16;

fn require_secret(config: &JwtSettings) -> Result<&str, ConfigError> {
    match config.signing_secret.as_deref() {
        Some(secret) if !secret.is_empty() => Ok(secret),
        _ => Err(ConfigError::MissingRequired("jwt.signing_secret".to_string())),
    }
}

#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
    issuer: String,
    audience: String,
}

impl TokenSigner {
    /// # Errors
    /// `ConfigError::MissingRequired` when no signing secret is configured
    pub fn from_settings(config: &JwtSettings) -> Result<Self, ConfigError> {
        let secret = require_secret(config)?;
        if secret.len() < MIN_RECOMMENDED_SECRET_BYTES {
            tracing::warn!(
                secret_bytes = secret.len(),
                "Signing secret is shorter than 128 bits"
            );
        }

        Ok(Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    /// Sign an access token valid for ten hours from `issued_at`
    pub fn sign(
        &self,
        user_id: Uuid,
        name: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims::new(user_id, name, role, issued_at, &self.issuer, &self.audience);

        encode(&Header::new(Algorithm::HS512), &claims, &self.key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn from_settings(config: &JwtSettings) -> Result<Self, ConfigError> {
        let secret = require_secret(config)?;

        let mut validation = Validation::new(Algorithm::HS512);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.validate_exp = true;
        // expiry is exact; no clock-skew allowance
        validation.leeway = 0;

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Check signature, issuer, audience and expiry; all four must pass.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!("JWT validation error: {}", e);
                AuthError::TokenInvalid
            })
    }
}
