/// Domain types
///
/// The user record and the transient token pair handed out on login/refresh.

mod user;

pub use user::{NewUser, Role, StoredRefreshToken, TokenResponse, User};
