/// Auth Service
///
/// Registration, login and refresh-token rotation on top of a `UserStore`.
/// Business failures come back as `AppError::Auth(..)`; store trouble as
/// `AppError::Store(..)`. The service keeps no state between calls.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::auth::{
    PasswordHasher, PasswordVerification, RandomSource, RefreshTokenGenerator, TokenSigner,
};
use crate::clock::{Clock, SystemClock};
use crate::configuration::Settings;
use crate::domain::{NewUser, Role, TokenResponse, User};
use crate::error::{AppError, AuthError, ConfigError, StoreError};
use crate::store::UserStore;

/// How many times a rotation is retried after losing a write race
const MAX_ROTATION_ATTEMPTS: u32 = 3;

/// Verified against on unknown-email logins
const DUMMY_PASSWORD: &str = "unknown-email-placeholder";

pub struct AuthService<S: UserStore> {
    store: Arc<S>,
    hasher: PasswordHasher,
    signer: TokenSigner,
    refresh_tokens: RefreshTokenGenerator,
    clock: Arc<dyn Clock>,
    admin_allow_list: HashSet<String>,
    /// Hash of `DUMMY_PASSWORD` at the configured cost, made on first use
    dummy_hash: OnceCell<String>,
}

impl<S: UserStore> AuthService<S> {
    pub fn new(store: Arc<S>, signer: TokenSigner) -> Self {
        Self {
            store,
            hasher: PasswordHasher::default(),
            signer,
            refresh_tokens: RefreshTokenGenerator::default(),
            clock: Arc::new(SystemClock),
            admin_allow_list: HashSet::new(),
            dummy_hash: OnceCell::new(),
        }
    }

    /// Build the service from loaded settings
    ///
    /// # Errors
    /// Fails when the signing secret is missing or the bcrypt cost is out of
    /// range; callers treat this as fatal.
    pub fn from_settings(store: Arc<S>, settings: &Settings) -> Result<Self, ConfigError> {
        let signer = TokenSigner::from_settings(&settings.jwt)?;
        let hasher = PasswordHasher::with_cost(settings.password.hash_cost)?;
        Ok(Self::new(store, signer)
            .with_hasher(hasher)
            .with_admin_allow_list(settings.admin.allow_list()))
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self.dummy_hash = OnceCell::new();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.refresh_tokens = RefreshTokenGenerator::new(random);
        self
    }

    pub fn with_admin_allow_list(mut self, allow_list: HashSet<String>) -> Self {
        self.admin_allow_list = allow_list;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Create a new account
    ///
    /// The record is inserted once, complete with role, password hash and an
    /// initial refresh token, so a failure never leaves a partial user behind.
    ///
    /// # Errors
    /// - `AuthError::EmailInUse` if the email is already registered
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AppError> {
        if self.store.exists(email).await? {
            tracing::info!("Registration rejected: email already in use");
            return Err(AuthError::EmailInUse.into());
        }

        let role = Role::for_email(email, &self.admin_allow_list);
        let password_hash = self.hash_password(password).await?;
        let refresh_token = self.refresh_tokens.issue(self.clock.now());

        let user = self
            .store
            .insert(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role,
                refresh_token,
            })
            .await
            .map_err(|e| match e {
                // lost a race against another registration of the same email
                StoreError::DuplicateEmail => AppError::Auth(AuthError::EmailInUse),
                other => AppError::Store(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Authenticate with email and password
    ///
    /// # Errors
    /// - `AuthError::InvalidCredentials` for an unknown email or a wrong
    ///   password, indistinguishably
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, AppError> {
        let user = match self.store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                // an unknown email costs one bcrypt verification, same as a wrong password
                let dummy = self
                    .dummy_hash
                    .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD))
                    .await?;
                self.verify_password(dummy, password).await?;
                tracing::debug!("Login failed: unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if self.verify_password(&user.password_hash, password).await? == PasswordVerification::Mismatch {
            tracing::debug!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let mut current = user;
        let mut attempt = 1;
        loop {
            let user_id = current.id;
            match self.rotate(current, self.clock.now()).await {
                Err(AppError::Store(StoreError::Conflict)) if attempt < MAX_ROTATION_ATTEMPTS => {
                    attempt += 1;
                    tracing::debug!(user_id = %user_id, attempt, "Retrying refresh token rotation");
                    current = self
                        .store
                        .find_by_id(user_id)
                        .await?
                        .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;
                }
                Ok(tokens) => {
                    tracing::info!(user_id = %user_id, "User logged in");
                    return Ok(tokens);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// The presented token is single-use: on success it is replaced, and any
    /// concurrent attempt with the same token is re-validated against the
    /// replaced record and rejected.
    ///
    /// # Errors
    /// - `AuthError::InvalidRefreshToken` for an unknown user, a token that
    ///   is not the current one, or an expired token
    pub async fn refresh_tokens(
        &self,
        user_id: Uuid,
        presented: &str,
    ) -> Result<TokenResponse, AppError> {
        let mut attempt = 1;
        loop {
            let now = self.clock.now();
            let user = self
                .store
                .find_by_id(user_id)
                .await?
                .ok_or(AppError::Auth(AuthError::InvalidRefreshToken))?;
            check_refresh_token(&user, presented, now)?;

            match self.rotate(user, now).await {
                Err(AppError::Store(StoreError::Conflict)) if attempt < MAX_ROTATION_ATTEMPTS => {
                    attempt += 1;
                    tracing::debug!(user_id = %user_id, attempt, "Re-validating refresh after write conflict");
                }
                Ok(tokens) => {
                    tracing::info!(user_id = %user_id, "Tokens refreshed");
                    return Ok(tokens);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Sign a fresh access token and replace the user's refresh token.
    ///
    /// Signing happens before the write, so a failure leaves the stored token untouched.
    async fn rotate(&self, mut user: User, now: DateTime<Utc>) -> Result<TokenResponse, AppError> {
        let access_token = self.signer.sign(user.id, &user.name, user.role, now)?;
        let refresh = self.refresh_tokens.issue(now);
        let refresh_token = refresh.token.clone();

        user.refresh_token = Some(refresh);
        self.store.update(&user).await?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
        })
    }

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let hasher = self.hasher;
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    async fn verify_password(
        &self,
        hash: &str,
        password: &str,
    ) -> Result<PasswordVerification, AppError> {
        let hasher = self.hasher;
        let hash = hash.to_owned();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &password)).await?
    }
}

fn check_refresh_token(user: &User, presented: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
    match &user.refresh_token {
        Some(stored) if stored.token != presented => {
            tracing::debug!(user_id = %user.id, "Refresh rejected: token is not current");
            Err(AuthError::InvalidRefreshToken)
        }
        Some(stored) if stored.is_expired_at(now) => {
            tracing::debug!(user_id = %user.id, expired_at = %stored.expires_at, "Refresh rejected: token expired");
            Err(AuthError::InvalidRefreshToken)
        }
        Some(_) => Ok(()),
        None => {
            tracing::debug!(user_id = %user.id, "Refresh rejected: no token on record");
            Err(AuthError::InvalidRefreshToken)
        }
    }
}
