//! Client-side routes and navigation

use std::fmt;
use std::sync::Mutex;

/// A client route. `Display` renders the path the browser version used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    Boards { page: u32, size: u32 },
    Board(String),
    NewBoard,
    EditBoard(String),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Signup => write!(f, "/signup"),
            Route::Boards { page, size } => write!(f, "/boards?page={page}&size={size}"),
            Route::Board(id) => write!(f, "/boards/{id}"),
            Route::NewBoard => write!(f, "/boards/new"),
            Route::EditBoard(id) => write!(f, "/boards/{id}/edit"),
        }
    }
}

/// Receives navigation requests from pages and the fetch wrapper.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that records every route it was sent to.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Route> {
        self.history.lock().ok().and_then(|h| h.last().cloned())
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(%route, "navigate");
        if let Ok(mut history) = self.history.lock() {
            history.push(route);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_render_paths() {
        assert_eq!(Route::Login.to_string(), "/login");
        assert_eq!(
            Route::Boards { page: 1, size: 10 }.to_string(),
            "/boards?page=1&size=10"
        );
        assert_eq!(Route::EditBoard("7".into()).to_string(), "/boards/7/edit");
    }

    #[test]
    fn history_records_in_order() {
        let nav = HistoryNavigator::new();
        nav.navigate(Route::Home);
        nav.navigate(Route::Login);
        assert_eq!(nav.history(), vec![Route::Home, Route::Login]);
        assert_eq!(nav.last(), Some(Route::Login));
    }
}
