//! Board CRUD routes
//!
//! Every route needs an access token (cookie first, bearer header second)
//! and forwards it to the backend as `Authorization: Bearer`. Post ids are
//! numeric; anything else is rejected by the path extractor with 400 before
//! the backend is contacted. Create and update rebuild the multipart body so
//! the `request` part is always sent as `application/json`.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use board_api::{Attachment, BoardUpload, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::cookies;
use crate::error::ApiError;
use crate::proxy::{ProxyState, board_result};

fn require_token(jar: &CookieJar, headers: &HeaderMap) -> Result<String, ApiError> {
    cookies::access_token(jar, headers).ok_or_else(|| ApiError::Unauthorized {
        message: "인증되지 않은 사용자입니다.".into(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<u32>,
    size: Option<u32>,
}

#[instrument(skip_all)]
pub async fn list(
    State(proxy): State<ProxyState>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let token = require_token(&jar, &headers)?;
    let page = params.page.unwrap_or(DEFAULT_PAGE);
    let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE);
    debug!(page, size, "listing boards");
    let response = proxy.backend.list_boards(&token, page, size).await?;
    board_result(response, "글 목록 조회에 실패했습니다.")
}

#[instrument(skip_all)]
pub async fn categories(
    State(proxy): State<ProxyState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = require_token(&jar, &headers)?;
    let response = proxy.backend.categories(&token).await?;
    board_result(response, "카테고리 조회에 실패했습니다.")
}

#[instrument(skip_all, fields(board_id = %id))]
pub async fn detail(
    State(proxy): State<ProxyState>,
    Path(id): Path<u64>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = require_token(&jar, &headers)?;
    let response = proxy.backend.get_board(&token, id).await?;
    board_result(response, "글 조회에 실패했습니다.")
}

#[instrument(skip_all)]
pub async fn create(
    State(proxy): State<ProxyState>,
    jar: CookieJar,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let token = require_token(&jar, &headers)?;
    let upload = read_upload(multipart)
        .await?
        .ok_or_else(|| ApiError::Validation("요청 데이터가 없습니다.".into()))?;
    let response = proxy.backend.create_board(&token, &upload).await?;
    board_result(response, "글 작성에 실패했습니다.")
}

#[instrument(skip_all, fields(board_id = %id))]
pub async fn update(
    State(proxy): State<ProxyState>,
    Path(id): Path<u64>,
    jar: CookieJar,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let token = require_token(&jar, &headers)?;
    let upload = read_upload(multipart)
        .await?
        .ok_or_else(|| ApiError::Validation("수정할 내용이 없습니다.".into()))?;
    let response = proxy.backend.update_board(&token, id, &upload).await?;
    board_result(response, "글 수정에 실패했습니다.")
}

#[instrument(skip_all, fields(board_id = %id))]
pub async fn delete(
    State(proxy): State<ProxyState>,
    Path(id): Path<u64>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = require_token(&jar, &headers)?;
    let response = proxy.backend.delete_board(&token, id).await?;
    board_result(response, "글 삭제에 실패했습니다.")
}

/// Collect the `request` and `file` parts. `None` when `request` is missing
/// or blank. An empty file part (no file chosen) counts as no file.
async fn read_upload(mut multipart: Multipart) -> Result<Option<BoardUpload>, ApiError> {
    let mut request = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Unexpected(format!("multipart: {e}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("request") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Unexpected(format!("multipart request part: {e}")))?;
                request = Some(text);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Unexpected(format!("multipart file part: {e}")))?;
                if data.is_empty() && file_name.is_empty() {
                    continue;
                }
                file = Some(Attachment {
                    file_name: if file_name.is_empty() { "file".into() } else { file_name },
                    content_type,
                    data,
                });
            }
            other => debug!(field = ?other, "ignoring unknown multipart field"),
        }
    }

    Ok(request
        .filter(|r| !r.trim().is_empty())
        .map(|request| BoardUpload { request, file }))
}
