use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;

// Durable session cookies; presence of all three means "logged in".
pub const ACCESS_TOKEN: &str = "access_token";
pub const ACCESS_TOKEN_SECRET: &str = "access_token_secret";
pub const USER_ID: &str = "twitter_id";

// Temporary handshake cookies, cleared once the handshake completes.
pub const TEMP_TOKEN: &str = "oauth_token";
pub const TEMP_TOKEN_SECRET: &str = "oauth_token_secret";

/// An authenticated caller, reconstructed from cookies on every request.
/// There is no server-side session record.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub access_token_secret: String,
    pub user_id: String,
}

impl Session {
    pub fn from_jar(jar: &CookieJar) -> Option<Session> {
        Some(Session {
            access_token: jar.get(ACCESS_TOKEN)?.value().to_string(),
            access_token_secret: jar.get(ACCESS_TOKEN_SECRET)?.value().to_string(),
            user_id: jar.get(USER_ID)?.value().to_string(),
        })
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Session::from_jar(&jar).ok_or(AppError::Unauthenticated)
    }
}
