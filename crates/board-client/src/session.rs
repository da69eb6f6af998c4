//! Persisted client session
//!
//! Holds the signed-in user and the two auth tokens the proxy hands out as
//! cookies. The state is an explicit, versioned struct written as JSON with
//! atomic temp-file + rename, so a crash mid-write never leaves a torn file.
//! A tokio Mutex serializes updates from request-time refresh and the
//! keepalive task.
//!
//! Every token change bumps a generation counter. The fetch wrapper reads it
//! before sending so concurrent 401s can tell whether someone else already
//! refreshed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use board_api::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, User};
use common::Secret;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Current on-disk layout version.
pub const SESSION_VERSION: u32 = 1;

/// Session contents. User and tokens are only ever cleared together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionState {
    pub user: Option<User>,
    pub access_token: Option<Secret<String>>,
    pub refresh_token: Option<Secret<String>>,
}

impl SessionState {
    /// Cookie header value for the proxy, if any token is held.
    pub fn cookie_header(&self) -> Option<String> {
        let pairs: Vec<String> = [
            (ACCESS_TOKEN_COOKIE, &self.access_token),
            (REFRESH_TOKEN_COOKIE, &self.refresh_token),
        ]
        .into_iter()
        .filter_map(|(name, token)| token.as_ref().map(|t| format!("{name}={}", t.expose())))
        .collect();
        (!pairs.is_empty()).then(|| pairs.join("; "))
    }
}

/// File envelope: `{"version": N, "state": {...}}`.
#[derive(Serialize, Deserialize)]
struct Persisted {
    version: u32,
    state: SessionState,
}

/// Bring any known layout up to `SESSION_VERSION`.
///
/// - version 0: `{"state": {"user", "accessToken"}, "version": 0}`, written
///   before the refresh token was tracked client-side
/// - no envelope at all: a bare `{"user", "accessToken"}` object
fn migrate(raw: serde_json::Value) -> Result<SessionState> {
    let parse = |value: serde_json::Value| {
        serde_json::from_value::<SessionState>(value)
            .map_err(|e| Error::Session(format!("parsing session state: {e}")))
    };

    let version = raw.get("version").and_then(|v| v.as_u64());
    let has_envelope = raw.get("state").is_some();

    match (version, has_envelope) {
        (Some(v), true) if v == u64::from(SESSION_VERSION) => {
            let persisted: Persisted = serde_json::from_value(raw)
                .map_err(|e| Error::Session(format!("parsing session file: {e}")))?;
            Ok(persisted.state)
        }
        (Some(0), true) => {
            let mut raw = raw;
            let state = parse(raw["state"].take())?;
            info!(from = 0, to = SESSION_VERSION, "migrated session file");
            Ok(state)
        }
        (None, false) => {
            let state = parse(raw)?;
            info!(from = "unversioned", to = SESSION_VERSION, "migrated session file");
            Ok(state)
        }
        (Some(v), _) if v > u64::from(SESSION_VERSION) => Err(Error::Session(format!(
            "session file version {v} is newer than supported version {SESSION_VERSION}"
        ))),
        _ => Err(Error::Session("unrecognized session file layout".into())),
    }
}

/// One `Set-Cookie` directive that touches a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieUpdate {
    pub name: String,
    /// `None` when the cookie is being expired.
    pub value: Option<String>,
}

impl CookieUpdate {
    /// Parse a `Set-Cookie` header, keeping only the two session cookies.
    pub fn parse(header: &str) -> Option<Self> {
        let cookie = cookie::Cookie::parse(header).ok()?;
        if cookie.name() != ACCESS_TOKEN_COOKIE && cookie.name() != REFRESH_TOKEN_COOKIE {
            return None;
        }
        let expired = cookie
            .max_age()
            .is_some_and(|age| age.is_negative() || age.is_zero());
        let value = (!expired && !cookie.value().is_empty()).then(|| cookie.value().to_owned());
        Some(Self {
            name: cookie.name().to_owned(),
            value,
        })
    }
}

/// Session store backed by an optional file.
pub struct SessionStore {
    path: Option<PathBuf>,
    state: Mutex<SessionState>,
    generation: AtomicU64,
}

impl SessionStore {
    /// Store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(SessionState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Load the session file, migrating older layouts.
    ///
    /// A missing file is a signed-out session; the file is created on the
    /// first write.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Session(format!("reading session file: {e}")))?;
            let raw: serde_json::Value = serde_json::from_str(&contents)
                .map_err(|e| Error::Session(format!("parsing session file: {e}")))?;
            let state = migrate(raw)?;
            debug!(path = %path.display(), signed_in = state.user.is_some(), "loaded session");
            state
        } else {
            debug!(path = %path.display(), "session file not found, starting signed out");
            SessionState::default()
        };

        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
            generation: AtomicU64::new(0),
        })
    }

    /// Counter bumped on every token change.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.lock().await.user.clone()
    }

    pub async fn has_access_token(&self) -> bool {
        self.state.lock().await.access_token.is_some()
    }

    pub async fn set_user(&self, user: User) -> Result<()> {
        let mut state = self.state.lock().await;
        state.user = Some(user);
        self.persist(&state).await
    }

    /// Apply token cookies delivered by the proxy.
    pub async fn absorb(&self, updates: &[CookieUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock().await;
        for update in updates {
            let slot = if update.name == ACCESS_TOKEN_COOKIE {
                &mut state.access_token
            } else {
                &mut state.refresh_token
            };
            *slot = update.value.clone().map(Secret::new);
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
        debug!(cookies = updates.len(), "absorbed session cookies");
        self.persist(&state).await
    }

    /// Drop user and tokens together.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = SessionState::default();
        self.generation.fetch_add(1, Ordering::AcqRel);
        info!("session cleared");
        self.persist(&state).await
    }

    async fn persist(&self, state: &SessionState) -> Result<()> {
        match &self.path {
            Some(path) => write_atomic(path, state).await,
            None => Ok(()),
        }
    }
}

/// Write the session file atomically with 0600 permissions (it holds tokens).
async fn write_atomic(path: &Path, state: &SessionState) -> Result<()> {
    let persisted = Persisted {
        version: SESSION_VERSION,
        state: state.clone(),
    };
    let json = serde_json::to_string_pretty(&persisted)
        .map_err(|e| Error::Session(format!("serializing session: {e}")))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Session(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Session(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Session(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session");
    Ok(())
}
