use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Server configuration, read from the environment once at startup and
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,

    pub consumer_key: String,
    pub consumer_secret: String,
    pub request_token_url: String,
    pub access_token_url: String,
    pub authorize_url: String,
    /// Base URL for authenticated API calls (ids/lookup/verify/list).
    pub api_base_url: String,
    /// Absolute callback URL registered with the provider; its path is
    /// mounted as the handshake-completion route.
    pub oauth_callback: String,

    pub cache_clear_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let consumer_key = env::var("FLOCK_CONSUMER_KEY")
            .context("FLOCK_CONSUMER_KEY must be set to the provider consumer key")?;
        let consumer_secret = env::var("FLOCK_CONSUMER_SECRET")
            .context("FLOCK_CONSUMER_SECRET must be set to the provider consumer secret")?;

        let host = env::var("FLOCK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env::var("FLOCK_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .context("FLOCK_PORT must be a port number")?;
        let db_path: PathBuf = env::var("FLOCK_DB_PATH")
            .unwrap_or_else(|_| "flock.db".into())
            .into();
        let cache_clear_secs: u64 = env::var("FLOCK_CACHE_CLEAR_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .context("FLOCK_CACHE_CLEAR_SECS must be a number of seconds")?;

        Ok(Self {
            host,
            port,
            db_path,
            consumer_key,
            consumer_secret,
            request_token_url: env::var("FLOCK_REQUEST_TOKEN_URL")
                .unwrap_or_else(|_| "https://api.twitter.com/oauth/request_token".into()),
            access_token_url: env::var("FLOCK_ACCESS_TOKEN_URL")
                .unwrap_or_else(|_| "https://api.twitter.com/oauth/access_token".into()),
            authorize_url: env::var("FLOCK_AUTHORIZE_URL")
                .unwrap_or_else(|_| "https://api.twitter.com/oauth/authenticate".into()),
            api_base_url: env::var("FLOCK_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.twitter.com/1.1".into()),
            oauth_callback: env::var("FLOCK_OAUTH_CALLBACK")
                .unwrap_or_else(|_| "http://localhost:3000/auth/twitter/callback".into()),
            cache_clear_secs,
        })
    }

    /// The route path where the provider redirects back after consent,
    /// extracted from the absolute callback URL.
    pub fn callback_path(&self) -> String {
        let rest = self
            .oauth_callback
            .split_once("://")
            .map(|(_, r)| r)
            .unwrap_or(&self.oauth_callback);
        match rest.find('/') {
            Some(i) => rest[i..].split('?').next().unwrap_or("/").to_string(),
            None => "/".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_callback(callback: &str) -> Config {
        Config {
            host: "127.0.0.1".into(),
            port: 3000,
            db_path: "flock.db".into(),
            consumer_key: "k".into(),
            consumer_secret: "s".into(),
            request_token_url: String::new(),
            access_token_url: String::new(),
            authorize_url: String::new(),
            api_base_url: String::new(),
            oauth_callback: callback.into(),
            cache_clear_secs: 300,
        }
    }

    #[test]
    fn test_callback_path_extraction() {
        assert_eq!(
            config_with_callback("http://localhost:3000/auth/twitter/callback").callback_path(),
            "/auth/twitter/callback"
        );
        assert_eq!(
            config_with_callback("https://flock.example.com/cb?x=1").callback_path(),
            "/cb"
        );
        assert_eq!(config_with_callback("https://flock.example.com").callback_path(), "/");
    }
}
