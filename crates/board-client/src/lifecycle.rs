//! Sign-in state transitions
//!
//! Login stores the user and starts the keepalive task; logout cancels it,
//! tells the proxy to expire the cookies, and clears the session whatever the
//! proxy answered.
//!
//! The proxy answers a successful signin with `{}` when the access token
//! carries no user claims. That is still a signed-in session, just one
//! without a display identity.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use board_api::User;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fetch::{ApiRequest, ApiResponse, AuthedClient};
use crate::forms::{LoginForm, SignupForm};
use crate::keepalive::{KeepaliveHandle, spawn_keepalive};
use crate::navigator::Route;

const SIGNIN_ROUTE: &str = "/api/auth/signin";
const SIGNUP_ROUTE: &str = "/api/auth/signup";
const LOGOUT_ROUTE: &str = "/api/auth/logout";

pub struct SessionLifecycle {
    client: Arc<AuthedClient>,
    keepalive_interval: Option<Duration>,
    keepalive: Mutex<Option<KeepaliveHandle>>,
}

impl SessionLifecycle {
    /// `keepalive_interval` of `None` disables the background refresh.
    pub fn new(client: Arc<AuthedClient>, keepalive_interval: Option<Duration>) -> Self {
        Self {
            client,
            keepalive_interval,
            keepalive: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &Arc<AuthedClient> {
        &self.client
    }

    /// Returns the signed-in user, or `None` when the proxy could not name one.
    pub async fn login(&self, form: &LoginForm) -> Result<Option<User>> {
        let request = form.validate()?;
        let body = serde_json::to_value(&request)
            .map_err(|e| Error::Session(format!("encoding signin body: {e}")))?;
        let response = self
            .client
            .send_once(&ApiRequest::post(SIGNIN_ROUTE).json(body))
            .await?;
        if !response.is_success() {
            return Err(Error::Request {
                status: response.status,
                message: response.error_message("로그인에 실패했습니다."),
            });
        }

        // The cookies were absorbed while dispatching; an unreadable body must
        // not leave them behind without a user.
        let user = match signed_in_user(&response) {
            Ok(user) => user,
            Err(e) => {
                if let Err(clear) = self.client.session().clear().await {
                    warn!(error = %clear, "failed to clear session after bad signin body");
                }
                return Err(e);
            }
        };
        match &user {
            Some(user) => {
                self.client.session().set_user(user.clone()).await?;
                info!(user = %user.username, "signed in");
            }
            None => warn!("signed in without user claims"),
        }
        self.start_keepalive();
        self.client.navigator().navigate(Route::Home);
        Ok(user)
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<()> {
        let request = form.validate()?;
        let body = serde_json::to_value(&request)
            .map_err(|e| Error::Session(format!("encoding signup body: {e}")))?;
        let response = self
            .client
            .send_once(&ApiRequest::post(SIGNUP_ROUTE).json(body))
            .await?;
        if !response.is_success() {
            return Err(Error::Request {
                status: response.status,
                message: response.error_message("문제가 발생했습니다."),
            });
        }
        info!(user = %request.username, "signed up");
        self.client.navigator().navigate(Route::Login);
        Ok(())
    }

    /// Always ends signed out; a failed proxy call is only logged.
    pub async fn logout(&self) -> Result<()> {
        self.stop_keepalive();
        match self.client.send_once(&ApiRequest::post(LOGOUT_ROUTE)).await {
            Ok(response) if !response.is_success() => {
                warn!(status = %response.status, "logout rejected by proxy");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "logout request failed"),
        }
        self.client.session().clear().await?;
        info!("signed out");
        self.client.navigator().navigate(Route::Login);
        Ok(())
    }

    /// Resume the keepalive for a session restored from disk.
    pub async fn resume(&self) {
        if self.client.session().has_access_token().await {
            self.start_keepalive();
        }
    }

    pub fn keepalive_running(&self) -> bool {
        self.keepalive_slot()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// The slot only holds a task handle, so a panic elsewhere while it was
    /// locked cannot leave it inconsistent; recover the guard.
    fn keepalive_slot(&self) -> MutexGuard<'_, Option<KeepaliveHandle>> {
        self.keepalive.lock().unwrap_or_else(|poisoned| {
            warn!("keepalive lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn start_keepalive(&self) {
        let Some(interval) = self.keepalive_interval else {
            return;
        };
        let mut slot = self.keepalive_slot();
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        *slot = Some(spawn_keepalive(self.client.clone(), interval));
    }

    fn stop_keepalive(&self) {
        if let Some(handle) = self.keepalive_slot().take() {
            handle.cancel();
        }
    }
}

/// `{}` (or an empty body) means signed in without user claims.
fn signed_in_user(response: &ApiResponse) -> Result<Option<User>> {
    if response.is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value = response.json()?;
    if value.as_object().is_some_and(|fields| fields.is_empty()) {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| board_api::Error::Decode(format!("signin body: {e}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::HistoryNavigator;
    use crate::session::SessionStore;
    use axum::http::StatusCode;
    use axum::response::{AppendHeaders, IntoResponse};
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    async fn start_auth_proxy() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let app = Router::new()
            .route(
                "/api/auth/signin",
                post(|Json(body): Json<serde_json::Value>| async move {
                    let cookies = AppendHeaders([
                        ("set-cookie", "accessToken=at; Path=/; HttpOnly; Max-Age=3600"),
                        ("set-cookie", "refreshToken=rt; Path=/; HttpOnly; Max-Age=604800"),
                    ]);
                    if body["password"] == "opaque12!" {
                        return (cookies, Json(serde_json::json!({}))).into_response();
                    }
                    if body["password"] == "garbled1!" {
                        return (cookies, "<html>oops</html>").into_response();
                    }
                    if body["password"] != "abcd123!" {
                        return (
                            StatusCode::UNAUTHORIZED,
                            Json(serde_json::json!({"message": "비밀번호가 올바르지 않습니다."})),
                        )
                            .into_response();
                    }
                    (
                        cookies,
                        Json(serde_json::json!({"username": body["username"], "name": "Kim"})),
                    )
                        .into_response()
                }),
            )
            .route(
                "/api/auth/signup",
                post(|| async { (StatusCode::CREATED, Json(serde_json::json!({}))) }),
            )
            .route(
                "/api/auth/refresh",
                post(|| async {
                    AppendHeaders([("set-cookie", "accessToken=at2; Path=/; HttpOnly; Max-Age=3600")])
                }),
            )
            .route(
                "/api/auth/logout",
                post(|| async {
                    (
                        AppendHeaders([
                            ("set-cookie", "accessToken=; Path=/; Max-Age=-1"),
                            ("set-cookie", "refreshToken=; Path=/; Max-Age=-1"),
                        ]),
                        Json(serde_json::json!({"message": "로그아웃 되었습니다."})),
                    )
                }),
            );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        url
    }

    async fn lifecycle(
        url: String,
        keepalive: Option<Duration>,
    ) -> (SessionLifecycle, Arc<HistoryNavigator>) {
        let nav = Arc::new(HistoryNavigator::new());
        let client = AuthedClient::new(
            reqwest::Client::new(),
            url,
            Arc::new(SessionStore::in_memory()),
            nav.clone(),
        );
        (SessionLifecycle::new(Arc::new(client), keepalive), nav)
    }

    fn credentials(password: &str) -> LoginForm {
        LoginForm {
            username: "kim@example.com".into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn login_stores_user_tokens_and_goes_home() {
        let (lifecycle, nav) = lifecycle(start_auth_proxy().await, None).await;

        let user = lifecycle.login(&credentials("abcd123!")).await.unwrap().unwrap();

        assert_eq!(user.name, "Kim");
        let state = lifecycle.client().session().snapshot().await;
        assert_eq!(state.user, Some(user));
        assert_eq!(state.access_token.unwrap().expose(), "at");
        assert_eq!(state.refresh_token.unwrap().expose(), "rt");
        assert_eq!(nav.last(), Some(Route::Home));
        assert!(!lifecycle.keepalive_running());
    }

    #[tokio::test]
    async fn login_without_user_claims_keeps_tokens_and_goes_home() {
        let (lifecycle, nav) = lifecycle(start_auth_proxy().await, None).await;

        let user = lifecycle.login(&credentials("opaque12!")).await.unwrap();

        assert_eq!(user, None);
        let state = lifecycle.client().session().snapshot().await;
        assert!(state.user.is_none());
        assert_eq!(state.access_token.unwrap().expose(), "at");
        assert_eq!(state.refresh_token.unwrap().expose(), "rt");
        assert_eq!(nav.last(), Some(Route::Home));
    }

    #[tokio::test]
    async fn unreadable_signin_body_leaves_no_tokens_behind() {
        let (lifecycle, nav) = lifecycle(start_auth_proxy().await, None).await;

        let err = lifecycle.login(&credentials("garbled1!")).await.unwrap_err();

        assert!(matches!(err, Error::Api(board_api::Error::Decode(_))), "got: {err:?}");
        let state = lifecycle.client().session().snapshot().await;
        assert!(state.user.is_none());
        assert!(state.access_token.is_none());
        assert!(state.refresh_token.is_none());
        assert!(nav.history().is_empty());
    }

    #[tokio::test]
    async fn rejected_login_reports_proxy_message() {
        let (lifecycle, nav) = lifecycle(start_auth_proxy().await, None).await;

        let err = lifecycle.login(&credentials("wrong123!")).await.unwrap_err();

        assert_eq!(err.to_string(), "비밀번호가 올바르지 않습니다.");
        assert!(lifecycle.client().session().user().await.is_none());
        assert!(nav.history().is_empty());
    }

    #[tokio::test]
    async fn empty_login_form_never_reaches_proxy() {
        let (lifecycle, _nav) = lifecycle("http://127.0.0.1:1".into(), None).await;
        let err = lifecycle.login(&credentials("")).await.unwrap_err();
        assert!(matches!(err, Error::Form(_)));
    }

    #[tokio::test]
    async fn signup_navigates_to_login() {
        let (lifecycle, nav) = lifecycle(start_auth_proxy().await, None).await;
        let form = SignupForm {
            username: "kim@example.com".into(),
            name: "Kim".into(),
            password: "abcd123!".into(),
            confirm_password: "abcd123!".into(),
        };
        lifecycle.signup(&form).await.unwrap();
        assert_eq!(nav.last(), Some(Route::Login));
    }

    #[tokio::test]
    async fn logout_cancels_keepalive_and_clears_session() {
        let (lifecycle, nav) =
            lifecycle(start_auth_proxy().await, Some(Duration::from_secs(60))).await;
        lifecycle.login(&credentials("abcd123!")).await.unwrap();
        assert!(lifecycle.keepalive_running());

        lifecycle.logout().await.unwrap();

        assert!(!lifecycle.keepalive_running());
        let state = lifecycle.client().session().snapshot().await;
        assert!(state.user.is_none());
        assert!(state.access_token.is_none());
        assert!(state.refresh_token.is_none());
        assert_eq!(nav.last(), Some(Route::Login));
    }

    #[tokio::test]
    async fn poisoned_keepalive_slot_still_starts_and_stops() {
        let (lifecycle, _nav) =
            lifecycle("http://127.0.0.1:1".into(), Some(Duration::from_secs(60))).await;
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _slot = lifecycle.keepalive.lock().unwrap();
                    panic!("panicked while holding the keepalive slot");
                })
                .join();
        });
        assert!(lifecycle.keepalive.is_poisoned());

        lifecycle.start_keepalive();
        assert!(lifecycle.keepalive_running());

        lifecycle.stop_keepalive();
        assert!(!lifecycle.keepalive_running());
    }

    #[tokio::test]
    async fn logout_clears_session_even_when_proxy_is_down() {
        let (lifecycle, nav) = lifecycle("http://127.0.0.1:1".into(), None).await;
        lifecycle
            .client()
            .session()
            .set_user(User {
                username: "kim@example.com".into(),
                name: "Kim".into(),
            })
            .await
            .unwrap();

        lifecycle.logout().await.unwrap();

        assert!(lifecycle.client().session().user().await.is_none());
        assert_eq!(nav.last(), Some(Route::Login));
    }
}
