//! OAuth 1.0a client: HMAC-SHA1 request signing, the three-legged token
//! handshake, and generic signed GET/POST calls against the provider API.

pub mod client;
pub mod error;
pub mod sign;

pub use client::{Credentials, OAuthClient, OAuthConfig};
pub use error::OAuthError;
