//! Authenticated fetch wrapper
//!
//! Sends requests to the proxy with the session's cookies (and the access
//! token as a bearer header). A 401 triggers one refresh through the proxy
//! refresh route followed by exactly one retry of the original request; a
//! second 401 is handed back to the caller unchanged.
//!
//! Refresh is single-flight: concurrent requests that hit 401 queue on one
//! guard, and whoever gets it after the session generation already moved on
//! retries with the refreshed tokens instead of refreshing again.
//!
//! When refresh fails (non-OK, or no new access token arrives) the session is
//! cleared, the navigator is sent to `/login`, and `Error::RefreshFailed` is
//! returned.

use std::sync::Arc;

use board_api::BoardUpload;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Method, StatusCode};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::navigator::{Navigator, Route};
use crate::session::{CookieUpdate, SessionStore};

pub use board_api::BackendResponse as ApiResponse;

/// Proxy route that exchanges the refresh cookie for new tokens
pub const REFRESH_ROUTE: &str = "/api/auth/refresh";

/// Replayable request body.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(BoardUpload),
}

/// Request against the proxy, relative to the client's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn multipart(mut self, upload: BoardUpload) -> Self {
        self.body = RequestBody::Multipart(upload);
        self
    }
}

/// HTTP client bound to one session.
pub struct AuthedClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    refresh_guard: Mutex<()>,
}

impl AuthedClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            session,
            navigator,
            refresh_guard: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Send with the 401 → refresh → single retry policy.
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let observed = self.session.generation();
        let response = self.dispatch(request).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        info!("access token rejected, refreshing");
        self.refresh_since(observed).await?;
        self.dispatch(request).await
    }

    /// Send once, without refresh handling. Used for signin/signup/logout.
    pub async fn send_once(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.dispatch(request).await
    }

    /// Refresh the tokens now (keepalive path).
    pub async fn refresh(&self) -> Result<()> {
        self.refresh_since(self.session.generation()).await
    }

    async fn refresh_since(&self, observed: u64) -> Result<()> {
        let _guard = self.refresh_guard.lock().await;

        if self.session.generation() != observed {
            // Tokens changed while this caller waited: another refresh won.
            return if self.session.has_access_token().await {
                Ok(())
            } else {
                Err(Error::RefreshFailed("세션이 만료되었습니다.".into()))
            };
        }

        let stale = self.access_token().await;
        let response = self.dispatch(&ApiRequest::post(REFRESH_ROUTE)).await?;
        if !response.is_success() {
            let reason = response.error_message("토큰 갱신에 실패했습니다.");
            return Err(self.abandon_session(reason).await);
        }

        // Only a different access token counts; a rotated refresh cookie alone
        // leaves the rejected token in place.
        let delivered = self
            .access_token()
            .await
            .is_some_and(|fresh| Some(&fresh) != stale.as_ref());
        if !delivered {
            return Err(self
                .abandon_session("갱신 후 새 액세스 토큰이 없습니다.".into())
                .await);
        }

        info!("token refresh succeeded");
        Ok(())
    }

    async fn access_token(&self) -> Option<String> {
        self.session
            .snapshot()
            .await
            .access_token
            .map(|t| t.expose().clone())
            .filter(|t| !t.is_empty())
    }

    /// Clear the session and send the user to the login page.
    async fn abandon_session(&self, reason: String) -> Error {
        warn!(reason = %reason, "token refresh failed, clearing session");
        if let Err(e) = self.session.clear().await {
            warn!(error = %e, "failed to clear session");
        }
        self.navigator.navigate(Route::Login);
        Error::RefreshFailed(reason)
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), request.path);
        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let state = self.session.snapshot().await;
        if let Some(cookie) = state.cookie_header() {
            builder = builder.header(COOKIE, cookie);
        }
        if let Some(token) = &state.access_token {
            builder = builder.bearer_auth(token.expose());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(upload) => builder.multipart(upload.to_form()?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let updates: Vec<CookieUpdate> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(CookieUpdate::parse)
            .collect();
        let body = response.bytes().await?;

        self.session.absorb(&updates).await?;
        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }
}
