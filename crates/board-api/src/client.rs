//! HTTP client for the external backend
//!
//! Every call returns the backend's status and raw body as a
//! `BackendResponse`. The proxy decides per route how to translate it, so
//! nothing here treats a non-2xx status as an error; only transport failures
//! surface as `Error`.

use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::constants::{BOARDS_PATH, CATEGORIES_PATH, REFRESH_PATH, SIGNIN_PATH, SIGNUP_PATH};
use crate::error::{Error, Result};
use crate::model::{BoardUpload, RefreshRequest, SigninRequest, SignupRequest};

/// Backend status plus the unparsed body.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// True for a missing or whitespace-only body.
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::Decode(format!("backend body ({}): {e}", self.status)))
    }

    /// The body as JSON, when it is JSON.
    pub fn json_value(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// User-facing message for a failed call.
    ///
    /// JSON bodies contribute their `message` field (or `default` when it is
    /// absent); non-JSON text is returned as-is; an empty body yields `default`.
    pub fn error_message(&self, default: &str) -> String {
        if self.is_empty() {
            return default.to_owned();
        }
        match self.json_value() {
            Some(value) => value
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or(default)
                .to_owned(),
            None => self.text(),
        }
    }
}

/// Backend API client. Cheap to clone; shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Item path for a post. Ids are numeric, so the segment can never
    /// escape `/boards/`.
    fn board_url(&self, id: u64) -> String {
        self.url(&format!("{BOARDS_PATH}/{id}"))
    }

    /// Exchange credentials for a token pair.
    pub async fn signin(&self, req: &SigninRequest) -> Result<BackendResponse> {
        self.execute(self.http.post(self.url(SIGNIN_PATH)).json(req))
            .await
    }

    /// Create an account. The confirmation field is not forwarded.
    pub async fn signup(&self, req: &SignupRequest) -> Result<BackendResponse> {
        self.execute(
            self.http
                .post(self.url(SIGNUP_PATH))
                .json(&req.backend_body()),
        )
        .await
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<BackendResponse> {
        self.execute(
            self.http
                .post(self.url(REFRESH_PATH))
                .json(&RefreshRequest { refresh_token }),
        )
        .await
    }

    pub async fn list_boards(
        &self,
        access_token: &str,
        page: u32,
        size: u32,
    ) -> Result<BackendResponse> {
        self.execute(
            self.http
                .get(self.url(BOARDS_PATH))
                .query(&[("page", page), ("size", size)])
                .bearer_auth(access_token),
        )
        .await
    }

    pub async fn categories(&self, access_token: &str) -> Result<BackendResponse> {
        self.execute(
            self.http
                .get(self.url(CATEGORIES_PATH))
                .bearer_auth(access_token),
        )
        .await
    }

    pub async fn get_board(&self, access_token: &str, id: u64) -> Result<BackendResponse> {
        self.execute(self.http.get(self.board_url(id)).bearer_auth(access_token))
            .await
    }

    pub async fn create_board(
        &self,
        access_token: &str,
        upload: &BoardUpload,
    ) -> Result<BackendResponse> {
        self.execute(
            self.http
                .post(self.url(BOARDS_PATH))
                .bearer_auth(access_token)
                .multipart(upload.to_form()?),
        )
        .await
    }

    pub async fn update_board(
        &self,
        access_token: &str,
        id: u64,
        upload: &BoardUpload,
    ) -> Result<BackendResponse> {
        self.execute(
            self.http
                .patch(self.board_url(id))
                .bearer_auth(access_token)
                .multipart(upload.to_form()?),
        )
        .await
    }

    pub async fn delete_board(&self, access_token: &str, id: u64) -> Result<BackendResponse> {
        self.execute(
            self.http
                .delete(self.board_url(id))
                .bearer_auth(access_token),
        )
        .await
    }

    #[instrument(skip_all)]
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<BackendResponse> {
        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;
        debug!(%status, bytes = body.len(), "backend responded");
        Ok(BackendResponse {
            status,
            content_type,
            body,
        })
    }
}
