/// Authentication Routes
///
/// Thin HTTP layer over `AuthService`: validates payloads, calls the
/// service, and lets `AppError` pick the status code.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Claims;
use crate::domain::{Role, User};
use crate::error::{AppError, AuthError, ErrorContext};
use crate::service::AuthService;
use crate::store::UserStore;
use crate::validators::{is_valid_email, is_valid_name, is_valid_password};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub user_id: Uuid,
    pub refresh_token: String,
}

/// Public view of a user record
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// POST /api/auth/register
///
/// # Errors
/// - 400: Validation errors (invalid email/password/name)
/// - 409: Email already in use
pub async fn register<S: UserStore + 'static>(
    form: web::Json<RegisterRequest>,
    service: web::Data<AuthService<S>>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let name = is_valid_name(&form.name)?;
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let user = service
        .register(&name, &email, &form.password)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password produce the same 400 response.
pub async fn login<S: UserStore + 'static>(
    form: web::Json<LoginRequest>,
    service: web::Data<AuthService<S>>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let tokens = service.login(&email, &form.password).await.map_err(|e| {
        context.log_error(&e);
        e
    })?;

    Ok(HttpResponse::Ok().json(tokens))
}

/// POST /api/auth/refresh-token
///
/// # Errors
/// - 401: Unknown user, stale or expired refresh token
pub async fn refresh_token<S: UserStore + 'static>(
    form: web::Json<RefreshTokenRequest>,
    service: web::Data<AuthService<S>>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh").with_user_id(form.user_id.to_string());

    let tokens = service
        .refresh_tokens(form.user_id, &form.refresh_token)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    Ok(HttpResponse::Ok().json(tokens))
}

/// GET /api/auth
///
/// **Requires valid JWT access token** in the Authorization header.
pub async fn authenticated_only(claims: web::ReqData<Claims>) -> HttpResponse {
    tracing::info!(user = %claims.name, "Authenticated endpoint accessed");
    HttpResponse::Ok().body("You are logged in!")
}

/// GET /api/auth/admin-only
///
/// **Requires an Admin access token**; any other role gets 403.
pub async fn admin_only(claims: web::ReqData<Claims>) -> Result<HttpResponse, AppError> {
    if !claims.is_admin() {
        return Err(AuthError::InsufficientRole.into());
    }

    tracing::info!(user = %claims.name, "Admin endpoint accessed");
    Ok(HttpResponse::Ok().body("You are an admin!"))
}
