//! Backend endpoints and shared limits
//!
//! Paths are relative to the configured backend base URL. The base URL
//! itself is configuration; `DEFAULT_BACKEND_URL` is only the fallback.

/// Public backend host used when no base URL is configured
pub const DEFAULT_BACKEND_URL: &str = "https://front-mission.bigs.or.kr";

/// Credential exchange for a token pair
pub const SIGNIN_PATH: &str = "/auth/signin";

/// Account creation
pub const SIGNUP_PATH: &str = "/auth/signup";

/// Refresh token exchange for a new token pair
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Board collection (list, create) and item prefix (`/boards/{id}`)
pub const BOARDS_PATH: &str = "/boards";

/// Category enumeration
pub const CATEGORIES_PATH: &str = "/boards/categories";

/// Page index used when the caller omits `page`
pub const DEFAULT_PAGE: u32 = 0;

/// Page size used when the caller omits `size`
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest attachment the board form accepts (1 MiB)
pub const MAX_ATTACHMENT_BYTES: usize = 1024 * 1024;

/// HttpOnly cookie carrying the access token between client and proxy
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// HttpOnly cookie carrying the refresh token between client and proxy
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
