//! Error types for client operations

use reqwest::StatusCode;

use crate::forms::FormError;

/// Errors from client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error(transparent)]
    Api(#[from] board_api::Error),

    /// The proxy answered with a non-OK status; `message` is user-facing.
    #[error("{message}")]
    Request { status: StatusCode, message: String },

    #[error(transparent)]
    Form(#[from] FormError),

    /// Token refresh failed; the session has been cleared.
    #[error("토큰 갱신에 실패했습니다: {0}")]
    RefreshFailed(String),

    #[error("session store error: {0}")]
    Session(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else {
            Error::Http(e.to_string())
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
