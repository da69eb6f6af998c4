//! Wire model shared by the proxy and the client
//!
//! Field names follow the backend's camelCase JSON. Scalars the backend may
//! omit default to zero/false/empty so a partial page still deserializes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Signed-in identity, decoded from the access token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub name: String,
}

/// Access/refresh pair returned by signin and refresh.
///
/// Either token may be missing from a malformed backend reply; callers treat
/// anything short of both as "no new tokens".
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    /// Both tokens, only when the backend delivered both.
    pub fn both(&self) -> Option<(&str, &str)> {
        match (self.access_token.as_deref(), self.refresh_token.as_deref()) {
            (Some(a), Some(r)) if !a.is_empty() && !r.is_empty() => Some((a, r)),
            _ => None,
        }
    }
}

/// Inbound signin body. Missing fields deserialize as empty strings and are
/// rejected by validation.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Inbound signup body.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl SignupRequest {
    /// Body sent to the backend; the confirmation never leaves the proxy.
    pub fn backend_body(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "password": self.password,
            "name": self.name,
        })
    }
}

/// Body of the backend refresh call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// A bulletin board post.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// The detail endpoint calls this `boardCategory`.
    #[serde(default, alias = "boardCategory")]
    pub category: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Category option for the board form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Convert the backend's `{id: name}` category object into a list ordered by id.
pub fn categories_from_map(map: &serde_json::Map<String, serde_json::Value>) -> Vec<Category> {
    let mut categories: Vec<Category> = map
        .iter()
        .map(|(id, name)| Category {
            id: id.clone(),
            name: match name {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })
        .collect();
    categories.sort_by(|a, b| a.id.cmp(&b.id));
    categories
}

/// Pagination envelope mirrored from the backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// Zero-based page index
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub number_of_elements: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
}

/// The `request` part of a create/update upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BoardRequest {
    pub title: String,
    pub content: String,
    pub category: String,
}

/// Optional file attached to a post.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Multipart body for create/update, kept as plain data so it can be
/// re-encoded for every send.
#[derive(Debug, Clone)]
pub struct BoardUpload {
    /// JSON text of a `BoardRequest`
    pub request: String,
    pub file: Option<Attachment>,
}

impl BoardUpload {
    pub fn new(request: &BoardRequest, file: Option<Attachment>) -> Result<Self> {
        let request = serde_json::to_string(request)
            .map_err(|e| Error::Multipart(format!("serializing request part: {e}")))?;
        Ok(Self { request, file })
    }

    /// Encode as a multipart form: `request` as `application/json`, `file`
    /// with its original name and content type.
    pub fn to_form(&self) -> Result<reqwest::multipart::Form> {
        let request = reqwest::multipart::Part::text(self.request.clone())
            .mime_str("application/json")
            .map_err(|e| Error::Multipart(format!("request part: {e}")))?;
        let mut form = reqwest::multipart::Form::new().part("request", request);

        if let Some(file) = &self.file {
            let mut part = reqwest::multipart::Part::bytes(file.data.to_vec())
                .file_name(file.file_name.clone());
            if let Some(content_type) = &file.content_type {
                part = part
                    .mime_str(content_type)
                    .map_err(|e| Error::Multipart(format!("file part: {e}")))?;
            }
            form = form.part("file", part);
        }
        Ok(form)
    }
}
