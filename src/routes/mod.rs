mod auth;
mod health_check;

pub use auth::{
    admin_only, authenticated_only, login, refresh_token, register, LoginRequest,
    RefreshTokenRequest, RegisterRequest, UserResponse,
};
pub use health_check::health_check;
