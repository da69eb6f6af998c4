//! Shared handler state and backend response translation
//!
//! Successful backend bodies go back to the caller with the backend's status:
//! empty stays empty, JSON is re-emitted as JSON, anything else verbatim.

use axum::Json;
use axum::extract::FromRef;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use board_api::{BackendClient, BackendResponse};
use serde::de::DeserializeOwned;

use crate::cookies::CookiePolicy;
use crate::error::ApiError;

/// State the route handlers need, extracted from `AppState`.
#[derive(Clone)]
pub struct ProxyState {
    pub backend: BackendClient,
    pub cookies: CookiePolicy,
}

impl FromRef<crate::AppState> for ProxyState {
    fn from_ref(state: &crate::AppState) -> Self {
        state.proxy.clone()
    }
}

/// Relay a successful backend response.
pub fn passthrough(response: BackendResponse) -> Response {
    if response.is_empty() {
        return response.status.into_response();
    }
    match response.json_value() {
        Some(value) => (response.status, Json(value)).into_response(),
        None => {
            let content_type = response
                .content_type
                .clone()
                .unwrap_or_else(|| "text/plain; charset=utf-8".to_owned());
            (response.status, [(CONTENT_TYPE, content_type)], response.body).into_response()
        }
    }
}

/// Board route result: failures become `{message, status}`.
pub fn board_result(response: BackendResponse, default: &str) -> Result<Response, ApiError> {
    if !response.is_success() {
        return Err(ApiError::Board {
            status: response.status,
            message: response.error_message(default),
        });
    }
    Ok(passthrough(response))
}

/// Parse an inbound JSON body. Malformed JSON is not something the client
/// sends, so it is reported like any other unexpected failure.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Unexpected(format!("request body: {e}")))
}
