use std::sync::LazyLock;

use crate::config::{APP_ENV, CookieSecurity};
use crate::session::{MAX_SESSION_MAX_AGE, clamp_max_age};

use super::errors::CsrfError;

/// Shortest accepted HMAC secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

pub static CSRF_COOKIE_NAME: LazyLock<String> = LazyLock::new(|| {
    std::env::var("CSRF_COOKIE_NAME")
        .ok()
        .unwrap_or("csrf-token".to_string())
});

static CSRF_COOKIE_MAX_AGE: LazyLock<u64> = LazyLock::new(|| {
    let max_age = std::env::var("CSRF_COOKIE_MAX_AGE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30 * 24 * 60 * 60); // Same lifetime as the session cookie
    clamp_max_age(max_age)
});

/// Settings handed to [`CsrfGate`](super::CsrfGate).
#[derive(Clone)]
pub struct CsrfConfig {
    secret: Vec<u8>,
    pub cookie_name: String,
    pub header_name: String,
    pub max_age: u64,
    pub cookie_security: CookieSecurity,
}

impl std::fmt::Debug for CsrfConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfConfig")
            .field("secret", &"[redacted]")
            .field("cookie_name", &self.cookie_name)
            .field("header_name", &self.header_name)
            .field("max_age", &self.max_age)
            .field("cookie_security", &self.cookie_security)
            .finish()
    }
}

impl CsrfConfig {
    /// Defaults for everything but the secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, CsrfError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(CsrfError::InvalidSecret(format!(
                "secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }

        Ok(Self {
            secret,
            cookie_name: "csrf-token".to_string(),
            header_name: CSRF_HEADER_NAME.to_string(),
            max_age: 30 * 24 * 60 * 60,
            cookie_security: CookieSecurity::Relaxed,
        })
    }

    /// Reads `SESSION_SECRET` (required), `CSRF_COOKIE_NAME`, `CSRF_COOKIE_MAX_AGE`
    /// and `APP_ENV`.
    pub fn from_env() -> Result<Self, CsrfError> {
        let secret = std::env::var("SESSION_SECRET")
            .map_err(|_| CsrfError::InvalidSecret("SESSION_SECRET must be set".to_string()))?;

        Ok(Self {
            cookie_name: CSRF_COOKIE_NAME.clone(),
            max_age: *CSRF_COOKIE_MAX_AGE,
            cookie_security: APP_ENV.cookie_security(),
            ..Self::new(secret)?
        })
    }

    /// `Max-Age` for the token cookie, under the same cap as the session cookie.
    pub(crate) fn cookie_max_age(&self) -> i64 {
        self.max_age.min(MAX_SESSION_MAX_AGE) as i64
    }

    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }
}
