use thiserror::Error;

#[derive(Debug, Error)]
pub enum OAuthError {
    /// Transport-level failure talking to the provider.
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status. The body is kept
    /// verbatim so routes can pass it through to the caller.
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// A token reply that did not contain the expected fields.
    #[error("malformed provider reply: {0}")]
    Malformed(String),
}
