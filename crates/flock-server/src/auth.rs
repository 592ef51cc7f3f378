//! The three-legged handshake routes plus login/logout.
//!
//! State machine per attempt: unauthenticated → temp token issued (cookies)
//! → access token issued (session cookies). Nothing is retried; any failure
//! drops back to unauthenticated via a redirect to `/login`.

use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use tracing::{info, warn};

use flock_oauth::{Credentials, OAuthError};
use flock_types::provider::VerifiedIdentity;

use crate::error::AppError;
use crate::session::{ACCESS_TOKEN, ACCESS_TOKEN_SECRET, TEMP_TOKEN, TEMP_TOKEN_SECRET, USER_ID};
use crate::state::AppState;

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Flock</title></head>
<body>
  <h1>Flock</h1>
  <p><a href="/auth/twitter">Sign in with Twitter</a></p>
</body>
</html>
"#;

/// GET /login — the friends cache is wiped here as well as on logout, so a
/// fresh sign-in always starts from a live fetch.
pub async fn login(State(state): State<AppState>) -> Html<&'static str> {
    state.store.clear_friends("login");
    Html(LOGIN_PAGE)
}

/// GET /logout — drop the session cookies, wipe the cache, back to login.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    state.store.clear_friends("logout");
    let jar = jar
        .remove(removal(ACCESS_TOKEN))
        .remove(removal(ACCESS_TOKEN_SECRET))
        .remove(removal(USER_ID));
    (jar, Redirect::to("/login"))
}

/// GET /auth/twitter — obtain a temporary credential and send the user to
/// the provider's consent page. A provider failure here is terminal for the
/// attempt (no retry); the error response passes the provider body through.
pub async fn begin(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let temp = state.oauth.request_token().await?;

    let authorize = state.oauth.authorize_url(&temp.token);
    let jar = jar
        .add(http_only(TEMP_TOKEN, temp.token))
        .add(http_only(TEMP_TOKEN_SECRET, temp.secret));
    Ok((jar, Redirect::to(&authorize)))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub oauth_verifier: Option<String>,
}

/// GET {callback path} — completes the handshake. Success establishes the
/// session cookies and lands on `/`; any failure (missing parameter or
/// provider error at either step) leaves no session behind and lands on
/// `/login`.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> (CookieJar, Redirect) {
    match complete(&state, &jar, query).await {
        Ok(authenticated) => (authenticated, Redirect::to("/")),
        Err(e) => {
            warn!("handshake failed: {}", e);
            let jar = jar
                .remove(removal(TEMP_TOKEN))
                .remove(removal(TEMP_TOKEN_SECRET));
            (jar, Redirect::to("/login"))
        }
    }
}

async fn complete(
    state: &AppState,
    jar: &CookieJar,
    query: CallbackQuery,
) -> Result<CookieJar, AppError> {
    let temp_token = jar
        .get(TEMP_TOKEN)
        .map(|c| c.value().to_string())
        .ok_or(AppError::MissingParameter("oauth_token"))?;
    let temp_secret = jar
        .get(TEMP_TOKEN_SECRET)
        .map(|c| c.value().to_string())
        .ok_or(AppError::MissingParameter("oauth_token_secret"))?;
    let verifier = query
        .oauth_verifier
        .ok_or(AppError::MissingParameter("oauth_verifier"))?;

    // Exchange the verifier for the durable pair, then one authenticated
    // call to resolve the caller's stable user id.
    let durable = state
        .oauth
        .access_token(&temp_token, &temp_secret, &verifier)
        .await?;
    let identity = verify_credentials(state, &durable).await?;

    info!(
        "handshake complete for user {} (@{})",
        identity.id_str, identity.screen_name
    );

    Ok(jar
        .clone()
        .remove(removal(TEMP_TOKEN))
        .remove(removal(TEMP_TOKEN_SECRET))
        .add(http_only(ACCESS_TOKEN, durable.token))
        .add(http_only(ACCESS_TOKEN_SECRET, durable.secret))
        .add(http_only(USER_ID, identity.id_str)))
}

async fn verify_credentials(
    state: &AppState,
    creds: &Credentials,
) -> Result<VerifiedIdentity, AppError> {
    let url = format!(
        "{}/account/verify_credentials.json",
        state.config.api_base_url
    );
    let body = state.oauth.get(&url, &creds.token, &creds.secret).await?;
    serde_json::from_str(&body).map_err(|e| {
        AppError::Provider(OAuthError::Malformed(format!(
            "verify_credentials reply: {e}"
        )))
    })
}

fn http_only(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value)).http_only(true).path("/").build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Store, test_state};
    use axum::http::HeaderMap;
    use axum::http::header::COOKIE;

    fn jar(cookies: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        if !cookies.is_empty() {
            headers.insert(COOKIE, cookies.parse().unwrap());
        }
        CookieJar::from_headers(&headers)
    }

    #[tokio::test]
    async fn test_callback_requires_temp_cookies_and_verifier() {
        let state = test_state(Store::Unavailable);

        // No temp cookies at all
        let err = complete(
            &state,
            &jar(""),
            CallbackQuery {
                oauth_verifier: Some("v".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::MissingParameter("oauth_token")));

        // Temp cookies present but no verifier in the query
        let err = complete(
            &state,
            &jar("oauth_token=t; oauth_token_secret=s"),
            CallbackQuery {
                oauth_verifier: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::MissingParameter("oauth_verifier")));
    }
}
