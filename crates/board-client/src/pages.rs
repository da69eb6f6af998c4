//! Page actions: load data through the fetch wrapper and navigate
//!
//! Each function is what one screen does. Failures come back as
//! `Error::Request` carrying the message to show; an expired session comes
//! back as `Error::RefreshFailed` after the wrapper has redirected.

use board_api::{Board, Category, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, Page, categories_from_map};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fetch::{ApiRequest, ApiResponse, AuthedClient};
use crate::forms::BoardForm;
use crate::navigator::Route;
use crate::views::BoardsListView;

const BOARDS_ROUTE: &str = "/api/boards";
const CATEGORIES_ROUTE: &str = "/api/boards/categories";

fn board_route(id: &str) -> String {
    format!("{BOARDS_ROUTE}/{id}")
}

/// Turn a non-OK response into `Error::Request`.
fn ensure_ok(response: ApiResponse, default: &str) -> Result<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(Error::Request {
            status: response.status,
            message: response.error_message(default),
        })
    }
}

pub async fn load_boards(client: &AuthedClient, page: u32, size: u32) -> Result<BoardsListView> {
    let request = ApiRequest::get(BOARDS_ROUTE)
        .query("page", page)
        .query("size", size);
    let response = ensure_ok(
        client.send(&request).await?,
        "게시글 목록을 불러오는 데 실패했습니다.",
    )?;
    let page: Page<Board> = response.json()?;
    debug!(count = page.content.len(), total_pages = page.total_pages, "loaded boards");
    Ok(BoardsListView::from_page(page))
}

pub async fn load_board(client: &AuthedClient, id: &str) -> Result<Board> {
    let response = ensure_ok(
        client.send(&ApiRequest::get(board_route(id))).await?,
        "게시글을 불러오는 데 실패했습니다.",
    )?;
    Ok(response.json()?)
}

pub async fn load_categories(client: &AuthedClient) -> Result<Vec<Category>> {
    let response = ensure_ok(
        client.send(&ApiRequest::get(CATEGORIES_ROUTE)).await?,
        "카테고리를 불러오는 데 실패했습니다.",
    )?;
    let map: serde_json::Map<String, serde_json::Value> = response.json()?;
    Ok(categories_from_map(&map))
}

/// Whether the board form creates a post or edits one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

/// Submit the board form and navigate to the resulting post.
///
/// Goes to `/boards/{id}` when the response names an id (or, when editing,
/// to the edited post), otherwise back to the list.
pub async fn submit_board(client: &AuthedClient, mode: &FormMode, form: &BoardForm) -> Result<Route> {
    let upload = form.to_upload()?;
    let (request, default) = match mode {
        FormMode::Create => (ApiRequest::post(BOARDS_ROUTE), "글 작성에 실패했습니다."),
        FormMode::Edit(id) => (ApiRequest::patch(board_route(id)), "글 수정에 실패했습니다."),
    };
    let response = ensure_ok(client.send(&request.multipart(upload)).await?, default)?;

    let returned_id = response
        .json_value()
        .and_then(|body| match body.get("id")? {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        });
    let edited_id = match mode {
        FormMode::Edit(id) => Some(id.clone()),
        FormMode::Create => None,
    };

    let route = match returned_id.or(edited_id) {
        Some(id) => Route::Board(id),
        None => Route::Boards {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        },
    };
    info!(%route, "board saved");
    client.navigator().navigate(route.clone());
    Ok(route)
}

pub async fn delete_board(client: &AuthedClient, id: &str) -> Result<()> {
    ensure_ok(
        client.send(&ApiRequest::delete(board_route(id))).await?,
        "글 삭제에 실패했습니다.",
    )?;
    info!(board_id = id, "board deleted");
    client.navigator().navigate(Route::Boards {
        page: DEFAULT_PAGE,
        size: DEFAULT_PAGE_SIZE,
    });
    Ok(())
}
