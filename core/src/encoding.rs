//! Wire encodings shared by the request builders: query strings, form
//! bodies and the two `Authorization` schemes.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use url::form_urlencoded;

/// Build a `?k=v&k2=v2` suffix from ordered pairs, form-urlencoding each
/// key and value. Returns an empty string when `params` is empty.
pub fn query_string(params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return String::new();
    }
    format!("?{}", form_body(params))
}

/// `application/x-www-form-urlencoded` body. Keys may repeat.
pub fn form_body(params: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

/// Repeated `user_id=...` pairs, one per id, in input order.
pub fn user_id_form(user_ids: &[&str]) -> String {
    let pairs: Vec<(&str, &str)> = user_ids.iter().map(|id| ("user_id", *id)).collect();
    form_body(&pairs)
}

/// `Bearer <token>` header, or `None` for an empty token.
pub fn bearer_header(access_token: &str) -> Option<(String, String)> {
    if access_token.is_empty() {
        return None;
    }
    Some(("Authorization".to_string(), format!("Bearer {access_token}")))
}

/// `Basic base64(username:password)` credential value.
pub fn basic_credentials(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64_STANDARD.encode(format!("{username}:{password}")))
}

/// Inverse of `basic_credentials`. Splits on the first `:`, so a username
/// that itself contains `:` does not round-trip.
pub fn decode_basic_credentials(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?;
    let raw = BASE64_STANDARD.decode(encoded).ok()?;
    let text = String::from_utf8(raw).ok()?;
    let (username, password) = text.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
