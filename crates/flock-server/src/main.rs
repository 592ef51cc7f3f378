mod auth;
mod cleanup;
mod config;
mod error;
mod friends;
mod notes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use flock_oauth::{OAuthClient, OAuthConfig};

use crate::config::Config;
use crate::state::{AppState, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flock=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::load()?;

    // A failed open degrades to Store::Unavailable: every friend read then
    // live-fetches and note routes answer 503.
    let store = Store::open(&config.db_path);

    let oauth = OAuthClient::new(OAuthConfig {
        consumer_key: config.consumer_key.clone(),
        consumer_secret: config.consumer_secret.clone(),
        request_token_url: config.request_token_url.clone(),
        access_token_url: config.access_token_url.clone(),
        authorize_url: config.authorize_url.clone(),
        callback_url: config.oauth_callback.clone(),
    });

    let state = AppState {
        config: Arc::new(config.clone()),
        oauth: Arc::new(oauth),
        store: store.clone(),
    };

    // Periodic cache clear, independent of request traffic
    tokio::spawn(cleanup::run_clear_loop(store, config.cache_clear_secs));

    let app = build_router(&config.callback_path(), state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Flock server listening on {}", addr);
    info!("OAuth callback mounted at {}", config.callback_path());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_router(callback_path: &str, state: AppState) -> Router {
    Router::new()
        .route("/", get(friends::index))
        .route("/login", get(auth::login))
        .route("/logout", get(auth::logout))
        .route("/auth/twitter", get(auth::begin))
        .route(callback_path, get(auth::callback))
        .route("/friends", get(friends::raw_friends))
        .route(
            "/friends/{friend_id}/notes",
            get(notes::list_notes).post(notes::create_note),
        )
        .route(
            "/friends/{friend_id}/notes/{note_id}",
            put(notes::update_note).delete(notes::delete_note),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use flock_db::Database;
    use tower::ServiceExt;

    fn app(store: Store) -> Router {
        build_router("/auth/twitter/callback", test_state(store))
    }

    #[tokio::test]
    async fn test_index_redirects_to_login_without_session() {
        let response = app(Store::Unavailable)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_callback_without_handshake_state_redirects_to_login() {
        let response = app(Store::Unavailable)
            .oneshot(
                Request::get("/auth/twitter/callback?oauth_verifier=v")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_login_serves_page_and_wipes_cache() {
        let db = Database::open_in_memory().unwrap();
        db.insert_friends(&[flock_types::models::Friend {
            provider_id: "1".into(),
            owner_id: "u".into(),
            name: "stale".into(),
            screen_name: "stale".into(),
            location: String::new(),
            avatar_url: String::new(),
        }])
        .unwrap();
        let db = std::sync::Arc::new(db);

        let response = app(Store::Connected(db.clone()))
            .oneshot(Request::get("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(db.get_friends("u").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_raw_friends_requires_tokens() {
        let response = app(Store::Unavailable)
            .oneshot(Request::get("/friends").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_clears_session_cookies() {
        let response = app(Store::Unavailable)
            .oneshot(
                Request::get("/logout")
                    .header(
                        header::COOKIE,
                        "access_token=at; access_token_secret=ats; twitter_id=42",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");

        let cleared: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cleared.len(), 3);
        for name in ["access_token", "access_token_secret", "twitter_id"] {
            assert!(cleared.iter().any(|c| c.starts_with(&format!("{name}="))));
        }
    }
}
