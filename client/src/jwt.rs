//! Local, signature-less peek at a JWT payload. Used only to read the
//! expiry claim before attaching a token; verification stays on the server.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::Value;

pub fn decode_payload(token: &str) -> Option<Value> {
    let mut parts = token.split('.');
    parts.next()?;
    let payload = parts.next()?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&decoded).ok()
}

pub fn expires_at(token: &str) -> Option<i64> {
    decode_payload(token)?.get("exp")?.as_i64()
}

/// Whether the token expires within `leeway_secs` from now. Tokens that
/// cannot be decoded count as already expired.
pub fn expires_within(token: &str, leeway_secs: i64) -> bool {
    match expires_at(token) {
        Some(exp) => exp - chrono::Utc::now().timestamp() < leeway_secs,
        None => true,
    }
}
