//! Auth cookie handling
//!
//! Tokens travel between client and proxy only as HttpOnly cookies with
//! `SameSite=Strict` and `Path=/`. Board routes also accept an
//! `Authorization: Bearer` header when the cookie is missing.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use board_api::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use cookie::time::Duration;

use crate::config::CookieConfig;

/// Attributes applied to every auth cookie the proxy sets.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub access_max_age_secs: i64,
    pub refresh_max_age_secs: i64,
    pub secure: bool,
}

impl From<&CookieConfig> for CookiePolicy {
    fn from(config: &CookieConfig) -> Self {
        Self {
            access_max_age_secs: config.access_max_age_secs,
            refresh_max_age_secs: config.refresh_max_age_secs,
            secure: config.secure,
        }
    }
}

impl CookiePolicy {
    fn cookie(&self, name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(Duration::seconds(max_age_secs))
            .build()
    }

    /// Add both token cookies to the response jar.
    pub fn issue(&self, jar: CookieJar, access_token: &str, refresh_token: &str) -> CookieJar {
        jar.add(self.cookie(ACCESS_TOKEN_COOKIE, access_token.to_owned(), self.access_max_age_secs))
            .add(self.cookie(REFRESH_TOKEN_COOKIE, refresh_token.to_owned(), self.refresh_max_age_secs))
    }

    /// Blank both token cookies with `Max-Age=-1` so the client drops them.
    pub fn expire(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.cookie(ACCESS_TOKEN_COOKIE, String::new(), -1))
            .add(self.cookie(REFRESH_TOKEN_COOKIE, String::new(), -1))
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Access token from the cookie, else from a bearer header.
pub fn access_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    jar.get(ACCESS_TOKEN_COOKIE)
        .and_then(|c| non_empty(c.value()))
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .and_then(non_empty)
        })
}

pub fn refresh_token(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_TOKEN_COOKIE).and_then(|c| non_empty(c.value()))
}
