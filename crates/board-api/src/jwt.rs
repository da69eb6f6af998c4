//! Access token payload decoding
//!
//! The proxy only reads the `username` and `name` claims to build the
//! signed-in `User`. Signature verification belongs to the backend, which
//! checks the token on every forwarded call.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;
use tracing::debug;

use crate::model::User;

/// base64url that tolerates both padded and unpadded segments
const JWT_SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Deserialize)]
struct Claims {
    username: String,
    name: String,
}

/// Decode the user identity from a JWT's payload segment.
///
/// Returns `None` for anything that is not a three-segment token with a JSON
/// payload carrying both claims.
pub fn decode_user(token: &str) -> Option<User> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => {
            debug!("access token is not a three-segment JWT");
            return None;
        }
    };

    let bytes = JWT_SEGMENT
        .decode(payload)
        .map_err(|e| debug!(error = %e, "access token payload is not base64url"))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| debug!(error = %e, "access token payload lacks user claims"))
        .ok()?;

    Some(User {
        username: claims.username,
        name: claims.name,
    })
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &serde_json::Value) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.sig",
        engine.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
        engine.encode(payload.to_string())
    )
}
