//! Terminal rendering of pages
//!
//! View structs hold what a page shows; `render_*` turn them into text.

use std::fmt::Write as _;

use board_api::{Board, Category, Page, User};
use chrono::NaiveDateTime;

/// Pagination controls for a list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    /// Zero-based current page
    pub current: u32,
    pub total_pages: u32,
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

impl PaginationView {
    pub fn from_page<T>(page: &Page<T>) -> Self {
        Self {
            current: page.number,
            total_pages: page.total_pages,
            prev_disabled: page.first,
            next_disabled: page.last,
        }
    }

    pub fn label(&self) -> String {
        format!("Page {} of {}", self.current.saturating_add(1), self.total_pages)
    }

    pub fn render(&self) -> String {
        let prev = if self.prev_disabled { "(이전)" } else { "[이전]" };
        let next = if self.next_disabled { "(다음)" } else { "[다음]" };
        format!("{prev}  {}  {next}", self.label())
    }
}

/// The boards list page.
#[derive(Debug, Clone)]
pub struct BoardsListView {
    pub boards: Vec<Board>,
    /// Present only when there is more than one page.
    pub pagination: Option<PaginationView>,
}

impl BoardsListView {
    pub fn from_page(page: Page<Board>) -> Self {
        let pagination = (page.total_pages > 1).then(|| PaginationView::from_page(&page));
        Self {
            boards: page.content,
            pagination,
        }
    }

    pub fn render(&self) -> String {
        let mut out = render_board_table(&self.boards);
        if let Some(pagination) = &self.pagination {
            out.push('\n');
            out.push_str(&pagination.render());
            out.push('\n');
        }
        out
    }
}

/// Date part of a backend timestamp, or the raw value when it does not parse.
pub fn format_date(created_at: &str) -> String {
    let parsed = NaiveDateTime::parse_from_str(created_at, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.date())
        .or_else(|_| {
            chrono::DateTime::parse_from_rfc3339(created_at).map(|dt| dt.date_naive())
        });
    match parsed {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => created_at.to_owned(),
    }
}

pub fn render_board_table(boards: &[Board]) -> String {
    if boards.is_empty() {
        return "게시글이 없습니다.\n".to_owned();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{:<6} | {:<10} | {:<40} | 작성일", "ID", "카테고리", "제목");
    for board in boards {
        let _ = writeln!(
            out,
            "{:<6} | {:<10} | {:<40} | {}",
            board.id,
            board.category,
            board.title,
            format_date(&board.created_at)
        );
    }
    out
}

pub fn render_board_detail(board: &Board) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", board.title);
    let _ = writeln!(out, "카테고리: {}", board.category);
    let _ = writeln!(out, "작성일: {}", format_date(&board.created_at));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", board.content);
    if let Some(url) = &board.image_url {
        let _ = writeln!(out);
        let _ = writeln!(out, "첨부파일: {url}");
    }
    out
}

pub fn render_categories(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| format!("{}\t{}\n", c.id, c.name))
        .collect()
}

/// Header line: greeting with logout when signed in, auth links otherwise.
pub fn render_header(user: Option<&User>) -> String {
    match user {
        Some(user) => format!("안녕하세요, {}님 ({})  [로그아웃]", user.name, user.username),
        None => "[로그인]  [회원가입]".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(id: i64, created_at: &str) -> Board {
        Board {
            id,
            title: format!("글 {id}"),
            content: "본문".into(),
            category: "FREE".into(),
            created_at: created_at.into(),
            image_url: None,
        }
    }

    fn page(total_pages: u32, first: bool, last: bool) -> Page<Board> {
        serde_json::from_value(serde_json::json!({
            "content": [{"id": 1, "title": "글 1", "category": "FREE", "createdAt": "2025-03-01T10:00:00"}],
            "number": 0, "totalPages": total_pages, "first": first, "last": last
        }))
        .unwrap()
    }

    #[test]
    fn first_of_three_pages_disables_prev_only() {
        let view = BoardsListView::from_page(page(3, true, false));
        let pagination = view.pagination.unwrap();
        assert!(pagination.prev_disabled);
        assert!(!pagination.next_disabled);
        assert_eq!(pagination.label(), "Page 1 of 3");
        assert_eq!(pagination.render(), "(이전)  Page 1 of 3  [다음]");
    }

    #[test]
    fn label_saturates_on_out_of_range_page_number() {
        let view = PaginationView {
            current: u32::MAX,
            total_pages: u32::MAX,
            prev_disabled: false,
            next_disabled: true,
        };
        assert_eq!(view.label(), format!("Page {} of {}", u32::MAX, u32::MAX));
    }

    #[test]
    fn single_page_hides_pagination() {
        let view = BoardsListView::from_page(page(1, true, true));
        assert!(view.pagination.is_none());
        assert!(!view.render().contains("Page"));
    }

    #[test]
    fn dates_render_without_time() {
        assert_eq!(format_date("2025-03-01T10:00:00"), "2025-03-01");
        assert_eq!(format_date("2025-03-01T10:00:00.123456"), "2025-03-01");
        assert_eq!(format_date("2025-03-01T10:00:00+09:00"), "2025-03-01");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn table_lists_each_board() {
        let out = render_board_table(&[board(1, "2025-03-01T10:00:00"), board(2, "")]);
        assert!(out.starts_with("ID"));
        assert!(out.contains("글 1"));
        assert!(out.contains("2025-03-01"));
        assert_eq!(out.lines().count(), 3);
        assert_eq!(render_board_table(&[]), "게시글이 없습니다.\n");
    }

    #[test]
    fn detail_shows_attachment_when_present() {
        let mut b = board(5, "2025-03-01T10:00:00");
        assert!(!render_board_detail(&b).contains("첨부파일"));
        b.image_url = Some("/media/5.png".into());
        assert!(render_board_detail(&b).contains("첨부파일: /media/5.png"));
    }

    #[test]
    fn header_greets_signed_in_user() {
        let user = User {
            username: "kim@example.com".into(),
            name: "Kim".into(),
        };
        assert_eq!(
            render_header(Some(&user)),
            "안녕하세요, Kim님 (kim@example.com)  [로그아웃]"
        );
        assert!(render_header(None).contains("[회원가입]"));
    }
}
