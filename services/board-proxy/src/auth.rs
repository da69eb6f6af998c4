//! Signin, signup, refresh and logout routes
//!
//! Tokens never appear in a response body. Signin and refresh hand them to
//! the client as cookies; logout expires both cookies unconditionally.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use board_api::validation::{validate_signin, validate_signup};
use board_api::{SigninRequest, SignupRequest, TokenPair, decode_user};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::cookies;
use crate::error::ApiError;
use crate::proxy::{ProxyState, parse_json, passthrough};

#[instrument(skip_all)]
pub async fn signin(
    State(proxy): State<ProxyState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: SigninRequest = parse_json(&body)?;
    validate_signin(&request).map_err(|e| ApiError::Validation(e.to_string()))?;

    let response = proxy.backend.signin(&request).await?;
    if !response.is_success() {
        return Err(ApiError::Auth {
            status: response.status,
            message: response.error_message("로그인에 실패했습니다."),
        });
    }

    let tokens: TokenPair = response.json()?;
    let user = tokens.access_token.as_deref().and_then(decode_user);
    let body = match &user {
        Some(user) => serde_json::json!({ "username": user.username, "name": user.name }),
        None => {
            warn!("signin succeeded but the access token carried no user claims");
            serde_json::json!({})
        }
    };

    let jar = match tokens.both() {
        Some((access, refresh)) => proxy.cookies.issue(jar, access, refresh),
        None => {
            warn!("signin response is missing a token, no cookies set");
            jar
        }
    };

    info!(user = %request.username, "signed in");
    Ok((response.status, jar, Json(body)).into_response())
}

#[instrument(skip_all)]
pub async fn signup(State(proxy): State<ProxyState>, body: Bytes) -> Result<Response, ApiError> {
    let request: SignupRequest = parse_json(&body)?;
    validate_signup(&request).map_err(|e| ApiError::Validation(e.to_string()))?;

    let response = proxy.backend.signup(&request).await?;
    if !response.is_success() {
        let message = if !response.is_empty() && response.json_value().is_none() {
            format!("외부 API 에러: {}", response.text())
        } else {
            response.error_message("문제가 발생했습니다.")
        };
        return Err(ApiError::Auth {
            status: response.status,
            message,
        });
    }

    info!(user = %request.username, "account created");
    Ok(passthrough(response))
}

#[instrument(skip_all)]
pub async fn refresh(
    State(proxy): State<ProxyState>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let refresh_token = cookies::refresh_token(&jar).ok_or_else(|| ApiError::Unauthorized {
        message: "리프레시 토큰이 없습니다.".into(),
    })?;

    let response = proxy.backend.refresh(&refresh_token).await?;
    if !response.is_success() {
        info!(status = %response.status, "backend rejected refresh token");
        return Err(ApiError::Auth {
            status: response.status,
            message: response.error_message("토큰 갱신에 실패했습니다."),
        });
    }

    let tokens: TokenPair = response.json()?;
    let Some((access, refresh)) = tokens.both() else {
        return Err(ApiError::Validation("새로운 토큰 정보가 없습니다.".into()));
    };

    let jar = proxy.cookies.issue(jar, access, refresh);
    info!("tokens refreshed");
    Ok((
        StatusCode::OK,
        jar,
        Json(serde_json::json!({ "message": "토큰이 성공적으로 갱신되었습니다." })),
    )
        .into_response())
}

pub async fn logout(State(proxy): State<ProxyState>, jar: CookieJar) -> Response {
    info!("signed out");
    (
        StatusCode::OK,
        proxy.cookies.expire(jar),
        Json(serde_json::json!({ "message": "로그아웃 되었습니다." })),
    )
        .into_response()
}
