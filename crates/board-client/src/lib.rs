//! Bulletin board client
//!
//! Plays the browser's part against the board proxy: a persisted session,
//! the authenticated fetch wrapper, form validation, and terminal views.
//!
//! Request flow:
//! 1. A page action builds an `ApiRequest` and hands it to `AuthedClient`
//! 2. The wrapper sends it with the session cookies; `Set-Cookie` replies
//!    update the `SessionStore`
//! 3. On 401 the wrapper refreshes once (single-flight) and retries once
//! 4. If refresh fails the session is cleared and the navigator goes to
//!    `/login`
//! 5. `SessionLifecycle` owns login/logout and the background keepalive

pub mod error;
pub mod fetch;
pub mod forms;
pub mod keepalive;
pub mod lifecycle;
pub mod navigator;
pub mod pages;
pub mod session;
pub mod views;

pub use error::{Error, Result};
pub use fetch::{ApiRequest, ApiResponse, AuthedClient, RequestBody};
pub use forms::{BoardForm, FormError, LoginForm, SignupForm};
pub use keepalive::{KeepaliveHandle, spawn_keepalive};
pub use lifecycle::SessionLifecycle;
pub use navigator::{HistoryNavigator, Navigator, Route};
pub use pages::FormMode;
pub use session::{SessionState, SessionStore};
pub use views::{BoardsListView, PaginationView};
