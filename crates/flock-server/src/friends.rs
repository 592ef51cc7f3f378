//! The friend sync pipeline: serve from the cache when warm, otherwise page
//! through the provider's id listing, look the ids up in bounded batches,
//! and rebuild the cache in the background.

use std::future::Future;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use serde::Deserialize;
use tracing::{info, warn};

use flock_oauth::OAuthError;
use flock_oauth::sign::percent_encode;
use flock_types::models::{Friend, sort_by_name};
use flock_types::provider::{IdsPage, ProviderUser};

use crate::error::AppError;
use crate::session::{ACCESS_TOKEN, ACCESS_TOKEN_SECRET, Session};
use crate::state::{AppState, Store};

/// The provider caps `users/lookup` at 100 ids per call.
pub const LOOKUP_BATCH_SIZE: usize = 100;

/// GET / — the friend list for the logged-in user, or a redirect to the
/// login page.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    let Some(session) = Session::from_jar(&jar) else {
        return Ok(Redirect::to("/login").into_response());
    };
    let friends = load_friends(&state, &session).await?;
    Ok(Json(friends).into_response())
}

/// Cache-or-fetch: a warm cache (≥1 row for this user) is authoritative and
/// costs no provider calls; anything else falls through to the live fetch.
/// Cache read failures are best-effort misses, never fatal.
pub async fn load_friends(state: &AppState, session: &Session) -> Result<Vec<Friend>, AppError> {
    if let Store::Connected(db) = &state.store {
        match db.get_friends(&session.user_id) {
            Ok(cached) if !cached.is_empty() => {
                info!("serving {} friends from cache", cached.len());
                let mut friends = cached;
                sort_by_name(&mut friends);
                return Ok(friends);
            }
            Ok(_) => {}
            Err(e) => warn!("cache read failed, falling back to live fetch: {}", e),
        }
    }
    live_fetch(state, session).await
}

async fn live_fetch(state: &AppState, session: &Session) -> Result<Vec<Friend>, AppError> {
    info!("live friend fetch for user {}", session.user_id);

    let ids = collect_friend_ids(|cursor| fetch_ids_page(state, session, cursor)).await?;
    let users = collect_lookups(&ids, |batch| lookup_batch(state, session, batch)).await?;

    let mut friends = project(users, &session.user_id);
    sort_by_name(&mut friends);

    // Best-effort cache rebuild, detached from the response. A failure is
    // logged and the next request simply live-fetches again.
    if let Store::Connected(db) = &state.store {
        let db = db.clone();
        let rows = friends.clone();
        tokio::spawn(async move {
            if let Err(e) = db.insert_friends(&rows) {
                warn!("friend cache write failed: {}", e);
            }
        });
    }

    Ok(friends)
}

/// Accumulate the full id set, one page at a time. Strictly sequential:
/// each request's cursor comes from the previous reply, starting at `-1`
/// and ending when the provider answers `"0"`. Any page error aborts the
/// whole pipeline; there are no partial results and no retries.
async fn collect_friend_ids<F, Fut>(mut fetch_page: F) -> Result<Vec<u64>, AppError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<IdsPage, AppError>>,
{
    let mut ids = Vec::new();
    let mut cursor = String::from("-1");
    while cursor != "0" {
        let page = fetch_page(cursor).await?;
        ids.extend(page.ids);
        cursor = page.next_cursor_str;
    }
    Ok(ids)
}

/// Issue one lookup per batch of ≤100 ids, all in flight at once, and merge
/// the replies in arrival order. The first error wins and aborts the
/// pipeline; the caller then sorts, so arrival order never shows through.
async fn collect_lookups<F, Fut>(ids: &[u64], lookup: F) -> Result<Vec<ProviderUser>, AppError>
where
    F: Fn(Vec<u64>) -> Fut,
    Fut: Future<Output = Result<Vec<ProviderUser>, AppError>>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut in_flight: FuturesUnordered<_> = ids
        .chunks(LOOKUP_BATCH_SIZE)
        .map(|batch| lookup(batch.to_vec()))
        .collect();

    let mut users = Vec::with_capacity(ids.len());
    while let Some(reply) = in_flight.next().await {
        users.extend(reply?);
    }
    Ok(users)
}

async fn fetch_ids_page(
    state: &AppState,
    session: &Session,
    cursor: String,
) -> Result<IdsPage, AppError> {
    let url = format!(
        "{}/friends/ids.json?user_id={}&cursor={}",
        state.config.api_base_url,
        percent_encode(&session.user_id),
        percent_encode(&cursor)
    );
    let body = state
        .oauth
        .get(&url, &session.access_token, &session.access_token_secret)
        .await?;
    serde_json::from_str(&body)
        .map_err(|e| AppError::Provider(OAuthError::Malformed(format!("ids page: {e}"))))
}

async fn lookup_batch(
    state: &AppState,
    session: &Session,
    batch: Vec<u64>,
) -> Result<Vec<ProviderUser>, AppError> {
    let joined = batch
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let url = format!(
        "{}/users/lookup.json?user_id={}",
        state.config.api_base_url,
        percent_encode(&joined)
    );
    let body = state
        .oauth
        .get(&url, &session.access_token, &session.access_token_secret)
        .await?;
    serde_json::from_str(&body)
        .map_err(|e| AppError::Provider(OAuthError::Malformed(format!("user lookup: {e}"))))
}

fn project(users: Vec<ProviderUser>, owner_id: &str) -> Vec<Friend> {
    users
        .into_iter()
        .map(|u| Friend {
            provider_id: u.id_str,
            owner_id: owner_id.to_string(),
            name: u.name,
            screen_name: u.screen_name,
            location: u.location,
            avatar_url: u.profile_image_url,
        })
        .collect()
}

// -- Raw passthrough --

#[derive(Debug, Deserialize)]
pub struct CursorQuery {
    pub cursor: Option<String>,
}

/// GET /friends — signed passthrough of the provider's paginated friend
/// listing. Only the token cookies are needed here; the provider resolves
/// the user from the token itself.
pub async fn raw_friends(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CursorQuery>,
) -> Result<Response, AppError> {
    let (Some(token), Some(secret)) = (jar.get(ACCESS_TOKEN), jar.get(ACCESS_TOKEN_SECRET)) else {
        return Err(AppError::Unauthenticated);
    };

    let mut url = format!("{}/friends/list.json", state.config.api_base_url);
    if let Some(cursor) = query.cursor {
        url = format!("{url}?cursor={}", percent_encode(&cursor));
    }

    let body = state.oauth.get(&url, token.value(), secret.value()).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
