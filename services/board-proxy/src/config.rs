//! Configuration types and loading
//!
//! Precedence: CLI args > env vars > config file > defaults. Every section
//! is optional, so an empty file yields a working local setup.

use board_api::DEFAULT_BACKEND_URL;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub cookies: CookieConfig,
}

/// Listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// External backend settings
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Auth cookie attributes
#[derive(Debug, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_access_max_age")]
    pub access_max_age_secs: i64,
    #[serde(default = "default_refresh_max_age")]
    pub refresh_max_age_secs: i64,
    #[serde(default)]
    pub secure: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            access_max_age_secs: default_access_max_age(),
            refresh_max_age_secs: default_refresh_max_age(),
            secure: false,
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_max_connections() -> usize {
    1000
}

fn default_base_url() -> String {
    DEFAULT_BACKEND_URL.to_owned()
}

fn default_timeout() -> u64 {
    30
}

fn default_access_max_age() -> i64 {
    60 * 60
}

fn default_refresh_max_age() -> i64 {
    60 * 60 * 24 * 7
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// - `BACKEND_URL` replaces `backend.base_url`
    /// - `APP_ENV=production` forces `cookies.secure`
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> common::Result<Self> {
        let mut config: Config = toml::from_str(contents)?;

        if let Ok(url) = std::env::var("BACKEND_URL") {
            if !url.trim().is_empty() {
                config.backend.base_url = url.trim().to_owned();
            }
        }
        if std::env::var("APP_ENV").is_ok_and(|env| env == "production") {
            config.cookies.secure = true;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.backend.base_url.starts_with("http://")
            && !self.backend.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "backend.base_url must start with http:// or https://, got: {}",
                self.backend.base_url
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(common::Error::Config(
                "backend.timeout_secs must be greater than 0".into(),
            ));
        }

        if self.server.max_connections == 0 {
            return Err(common::Error::Config(
                "server.max_connections must be greater than 0".into(),
            ));
        }

        if self.cookies.access_max_age_secs <= 0 || self.cookies.refresh_max_age_secs <= 0 {
            return Err(common::Error::Config(
                "cookie lifetimes must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("board-proxy.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that read or mutate process environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_overlay() {
        unsafe {
            remove_env("BACKEND_URL");
            remove_env("APP_ENV");
        }
    }

    #[test]
    fn empty_file_uses_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overlay();

        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(config.backend.base_url, "https://front-mission.bigs.or.kr");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.cookies.access_max_age_secs, 3600);
        assert_eq!(config.cookies.refresh_max_age_secs, 604_800);
        assert!(!config.cookies.secure);
    }

    #[test]
    fn load_reads_file_sections() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overlay();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board-proxy.toml");
        std::fs::write(
            &path,
            r#"
[server]
listen_addr = "0.0.0.0:8080"
max_connections = 64

[backend]
base_url = "http://127.0.0.1:9000"
timeout_secs = 5

[cookies]
access_max_age_secs = 60
secure = true
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.max_connections, 64);
        assert_eq!(config.backend.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.backend.timeout_secs, 5);
        assert_eq!(config.cookies.access_max_age_secs, 60);
        assert_eq!(config.cookies.refresh_max_age_secs, 604_800);
        assert!(config.cookies.secure);
    }

    #[test]
    fn load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/board-proxy.toml"));
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn invalid_toml_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overlay();
        let result = Config::from_toml("not valid {{{{ toml");
        assert!(matches!(result, Err(common::Error::Toml(_))));
    }

    #[test]
    fn backend_url_env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overlay();
        unsafe { set_env("BACKEND_URL", "http://backend.internal:8080") };

        let config = Config::from_toml("[backend]\nbase_url = \"https://file.example\"\n").unwrap();
        assert_eq!(config.backend.base_url, "http://backend.internal:8080");

        clear_overlay();
    }

    #[test]
    fn production_forces_secure_cookies() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overlay();
        unsafe { set_env("APP_ENV", "production") };

        let config = Config::from_toml("[cookies]\nsecure = false\n").unwrap();
        assert!(config.cookies.secure);

        clear_overlay();
    }

    #[test]
    fn base_url_without_scheme_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overlay();

        let err = Config::from_toml("[backend]\nbase_url = \"front-mission.bigs.or.kr\"\n")
            .unwrap_err()
            .to_string();
        assert!(
            err.contains("backend.base_url must start with http"),
            "error message should explain the issue, got: {err}"
        );
    }

    #[test]
    fn zero_values_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overlay();

        assert!(Config::from_toml("[backend]\ntimeout_secs = 0\n").is_err());
        assert!(Config::from_toml("[server]\nmax_connections = 0\n").is_err());
        assert!(Config::from_toml("[cookies]\nrefresh_max_age_secs = 0\n").is_err());
    }

    #[test]
    fn resolve_path_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("board-proxy.toml"));

        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("/env/path.toml"));
        assert_eq!(
            Config::resolve_path(Some("/cli/wins.toml")),
            PathBuf::from("/cli/wins.toml"),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );
        unsafe { remove_env("CONFIG_PATH") };
    }
}
