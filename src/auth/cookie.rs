//! Signed session cookie.
//!
//! The cookie value is `{session_id}.{hex(hmac_sha256(secret, session_id))}`.

use crate::config::Config;
use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{Cookie, SameSite};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, session_id: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(session_id.as_bytes());
    Some(mac)
}

/// Sign a session id with HMAC-SHA256.
pub fn sign_session_id(session_id: &str, secret: &str) -> String {
    let signature = mac_for(secret, session_id)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("{}.{}", session_id, signature)
}

/// Verify a signed cookie value and extract the session id.
///
/// Returns `None` if the value is malformed or the signature does not match.
pub fn verify_signed_cookie(cookie_value: &str, secret: &str) -> Option<String> {
    let (session_id, signature_hex) = cookie_value.rsplit_once('.')?;
    let signature = hex::decode(signature_hex).ok()?;

    // verify_slice compares in constant time
    match mac_for(secret, session_id)?.verify_slice(&signature) {
        Ok(()) => Some(session_id.to_owned()),
        Err(_) => {
            tracing::warn!(
                action = "session_cookie_tampered",
                cookie_prefix = %session_id.chars().take(8).collect::<String>(),
                "Session cookie signature mismatch"
            );
            None
        }
    }
}

/// Find the session cookie in the request headers.
pub fn read_session_cookie(headers: &HeaderMap, config: &Config) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == config.session_cookie_name)
        .map(|c| c.value().to_owned())
}

/// Build the `Set-Cookie` header value for a session.
///
/// Expiry is absolute (`Expires`) and relative (`Max-Age`), both refreshed
/// every time the session is written.
pub fn session_cookie(session_id: &str, config: &Config) -> Option<HeaderValue> {
    let ttl = time::Duration::seconds(i64::try_from(config.session_ttl_secs).unwrap_or(i64::MAX));
    let cookie = Cookie::build((
        config.session_cookie_name.clone(),
        sign_session_id(session_id, &config.session_secret),
    ))
    .path("/")
    .http_only(true)
    .secure(config.cookie_secure())
    .same_site(SameSite::Lax)
    .max_age(ttl)
    .expires(time::OffsetDateTime::now_utc().saturating_add(ttl))
    .build();

    HeaderValue::from_str(&cookie.to_string()).ok()
}
