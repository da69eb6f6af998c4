//! Handler error responses
//!
//! Auth routes answer `{"message"}`; board routes add the status:
//! `{"message", "status"}`. Transport and decoding failures never leak
//! details to the caller and become a generic 500.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Message returned for anything the proxy did not anticipate
pub const UNEXPECTED_MESSAGE: &str = "예상치 못한 오류가 발생했습니다.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request rejected before contacting the backend (400)
    #[error("{0}")]
    Validation(String),

    /// No usable token on the request
    #[error("{message}")]
    Unauthorized { message: String },

    /// Backend failure on an auth route
    #[error("{message}")]
    Auth { status: StatusCode, message: String },

    /// Backend failure on a board route
    #[error("{message}")]
    Board { status: StatusCode, message: String },

    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl From<board_api::Error> for ApiError {
    fn from(e: board_api::Error) -> Self {
        crate::metrics::record_backend_error(match &e {
            board_api::Error::Timeout(_) => "timeout",
            board_api::Error::Http(_) => "connection",
            board_api::Error::Multipart(_) => "multipart",
            board_api::Error::Decode(_) => "decode",
        });
        ApiError::Unexpected(e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Auth { status, .. } | ApiError::Board { status, .. } => *status,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(message)
            | ApiError::Unauthorized { message }
            | ApiError::Auth { message, .. } => serde_json::json!({ "message": message }),
            ApiError::Board { message, .. } => serde_json::json!({
                "message": message,
                "status": status.as_u16(),
            }),
            ApiError::Unexpected(detail) => {
                error!(error = %detail, "request failed unexpectedly");
                serde_json::json!({ "message": UNEXPECTED_MESSAGE })
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn board_errors_carry_status() {
        let response = ApiError::Board {
            status: StatusCode::FORBIDDEN,
            message: "권한이 없습니다.".into(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["message"], "권한이 없습니다.");
        assert_eq!(json["status"], 403);
    }

    #[tokio::test]
    async fn auth_errors_carry_message_only() {
        let response = ApiError::Auth {
            status: StatusCode::UNAUTHORIZED,
            message: "로그인에 실패했습니다.".into(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json, serde_json::json!({ "message": "로그인에 실패했습니다." }));
    }

    #[tokio::test]
    async fn unexpected_errors_hide_details() {
        let response =
            ApiError::from(board_api::Error::Http("connection refused".into())).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], UNEXPECTED_MESSAGE);
        assert!(!json.to_string().contains("refused"));
    }
}
