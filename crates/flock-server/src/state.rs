use std::path::Path;
use std::sync::Arc;

use flock_db::Database;
use flock_oauth::OAuthClient;
use tracing::warn;

use crate::config::Config;

/// Shared application state for all route handlers; built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub oauth: Arc<OAuthClient>,
    pub store: Store,
}

/// Handle to the friends/notes store. `Unavailable` is a real state, not an
/// undefined value: the server runs without it, treating every cached read
/// as a miss and answering 503 on routes that genuinely need storage.
#[derive(Clone)]
pub enum Store {
    Unavailable,
    Connected(Arc<Database>),
}

impl Store {
    /// Open the store; a failure degrades to `Unavailable` instead of
    /// aborting startup.
    pub fn open(path: &Path) -> Store {
        match Database::open(path) {
            Ok(db) => Store::Connected(Arc::new(db)),
            Err(e) => {
                warn!("store unavailable, running without cache: {}", e);
                Store::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Store::Connected(_))
    }

    pub fn db(&self) -> Option<&Arc<Database>> {
        match self {
            Store::Connected(db) => Some(db),
            Store::Unavailable => None,
        }
    }

    /// Wipe the cached friend lists. Invoked on login/logout and by the
    /// clear timer; a no-op while the store is unavailable.
    pub fn clear_friends(&self, reason: &str) {
        if let Store::Connected(db) = self {
            match db.delete_friends() {
                Ok(n) => {
                    if n > 0 {
                        tracing::info!("cleared {} cached friends ({})", n, reason);
                    }
                }
                Err(e) => warn!("friend cache clear failed ({}): {}", reason, e),
            }
        }
    }
}

#[cfg(test)]
pub fn test_state(store: Store) -> AppState {
    use flock_oauth::OAuthConfig;

    let config = Config {
        host: "127.0.0.1".into(),
        port: 0,
        db_path: ":memory:".into(),
        consumer_key: "test-key".into(),
        consumer_secret: "test-secret".into(),
        request_token_url: "https://provider.invalid/oauth/request_token".into(),
        access_token_url: "https://provider.invalid/oauth/access_token".into(),
        authorize_url: "https://provider.invalid/oauth/authenticate".into(),
        api_base_url: "https://provider.invalid/1.1".into(),
        oauth_callback: "http://localhost:3000/auth/twitter/callback".into(),
        cache_clear_secs: 300,
    };
    let oauth = OAuthClient::new(OAuthConfig {
        consumer_key: config.consumer_key.clone(),
        consumer_secret: config.consumer_secret.clone(),
        request_token_url: config.request_token_url.clone(),
        access_token_url: config.access_token_url.clone(),
        authorize_url: config.authorize_url.clone(),
        callback_url: config.oauth_callback.clone(),
    });
    AppState {
        config: Arc::new(config),
        oauth: Arc::new(oauth),
        store,
    }
}
