//! Bulletin board backend API
//!
//! Wire model and HTTP client for the external backend that owns users,
//! posts, categories, and attachments. The proxy service forwards to it
//! through `BackendClient`; the client crate reuses the model types and the
//! signup/login validation rules so both sides reject the same input.
//!
//! Request flow:
//! 1. Proxy validates the inbound body with `validation`
//! 2. `BackendClient` forwards it and returns a `BackendResponse`
//! 3. On signin/refresh the proxy reads the `TokenPair` and decodes the
//!    `User` from the access token with `jwt::decode_user`
//! 4. Non-OK responses are translated with `BackendResponse::error_message`

pub mod client;
pub mod constants;
pub mod error;
pub mod jwt;
pub mod model;
pub mod validation;

pub use client::{BackendClient, BackendResponse};
pub use constants::*;
pub use error::{Error, Result};
pub use jwt::decode_user;
pub use model::{
    Attachment, Board, BoardRequest, BoardUpload, Category, Page, RefreshRequest,
    SigninRequest, SignupRequest, TokenPair, User, categories_from_map,
};
pub use validation::ValidationError;
