//! Types shared by the board proxy and the board client

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
