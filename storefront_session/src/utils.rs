use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use http::header::{HeaderMap, SET_COOKIE};
use ring::rand::SecureRandom;
use thiserror::Error;

use crate::config::CookieSecurity;

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Random bytes from the system CSPRNG, base64url encoded without padding.
pub fn gen_random_string(len: usize) -> Result<String, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| UtilError::Crypto("Failed to generate random string".to_string()))?;
    Ok(base64url_encode(&bytes))
}

/// Append a `Set-Cookie` header.
///
/// `http_only` is false for cookies the front-end script must read (the CSRF
/// mirror cookie).
pub(crate) fn header_set_cookie(
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
    max_age: i64,
    http_only: bool,
    security: CookieSecurity,
) -> Result<(), UtilError> {
    let mut cookie = format!(
        "{name}={value}; SameSite={}; Path=/; Max-Age={max_age}",
        security.same_site()
    );
    if security.secure() {
        cookie.push_str("; Secure");
    }
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    tracing::trace!("Set-Cookie for '{}' (Max-Age={})", name, max_age);
    headers.append(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| UtilError::Cookie(format!("Failed to parse cookie {name}")))?,
    );
    Ok(())
}

/// Expire a cookie on the client.
pub(crate) fn header_clear_cookie(
    headers: &mut HeaderMap,
    name: &str,
    security: CookieSecurity,
) -> Result<(), UtilError> {
    header_set_cookie(headers, name, "", 0, true, security)
}

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_random_string_length_and_alphabet() {
        let value = gen_random_string(32).expect("random string");
        // 32 bytes -> 43 base64url characters without padding
        assert_eq!(value.len(), 43);
        assert!(
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_gen_random_string_is_random() {
        let a = gen_random_string(16).unwrap();
        let b = gen_random_string(16).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_header_set_cookie_development() {
        let mut headers = HeaderMap::new();
        header_set_cookie(
            &mut headers,
            "sessionId",
            "abc",
            60,
            true,
            CookieSecurity::Relaxed,
        )
        .unwrap();

        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert_eq!(
            cookie,
            "sessionId=abc; SameSite=Lax; Path=/; Max-Age=60; HttpOnly"
        );
    }

    #[test]
    fn test_header_set_cookie_production_readable() {
        let mut headers = HeaderMap::new();
        header_set_cookie(
            &mut headers,
            "csrf-token",
            "tok",
            60,
            false,
            CookieSecurity::Strict,
        )
        .unwrap();

        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Secure"));
        assert!(!cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_header_clear_cookie() {
        let mut headers = HeaderMap::new();
        header_clear_cookie(&mut headers, "sessionId", CookieSecurity::Relaxed).unwrap();
        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("sessionId=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_header_set_cookie_rejects_invalid_value() {
        let mut headers = HeaderMap::new();
        let result = header_set_cookie(
            &mut headers,
            "bad",
            "line\nbreak",
            60,
            true,
            CookieSecurity::Relaxed,
        );
        assert!(matches!(result, Err(UtilError::Cookie(_))));
    }
}
