use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use flock_oauth::OAuthError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum AppError {
    /// Session cookies missing or incomplete.
    #[error("not authenticated")]
    Unauthenticated,

    /// Handshake callback missing a required cookie or query field.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// A failed call to the provider. Fatal to the current request only;
    /// never retried.
    #[error(transparent)]
    Provider(#[from] OAuthError),

    /// The store never came up. Reads treat this as a cache miss upstream;
    /// routes that require storage answer 503.
    #[error("storage unavailable")]
    StorageUnavailable,

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    /// Also covers "owned by someone else" — the two are deliberately
    /// indistinguishable.
    #[error("not found")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED.into_response(),
            AppError::MissingParameter(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            // Provider error bodies pass through verbatim: client errors as
            // 400, everything else (transport, 5xx, unparseable) as 502.
            AppError::Provider(OAuthError::Provider { status, body }) => {
                let code = if (400..500).contains(&status) {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (code, body).into_response()
            }
            AppError::Provider(e) => {
                warn!("provider call failed: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
            }
            AppError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE.into_response(),
            AppError::Storage(e) => {
                error!("storage error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            AppError::NotFound => StatusCode::NOT_FOUND.into_response(),
        }
    }
}
