//! Error types for backend API operations

/// Errors from backend API operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("backend request timed out: {0}")]
    Timeout(String),

    #[error("invalid multipart body: {0}")]
    Multipart(String),

    #[error("response decode error: {0}")]
    Decode(String),
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

/// Result alias for backend operations.
pub type Result<T> = std::result::Result<T, Error>;
