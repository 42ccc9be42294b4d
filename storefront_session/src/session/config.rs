use std::sync::LazyLock;
use std::time::Duration;

use crate::config::{APP_ENV, CookieSecurity};

use super::main::DurabilityPolicy;

pub static SESSION_COOKIE_NAME: LazyLock<String> = LazyLock::new(|| {
    std::env::var("SESSION_COOKIE_NAME")
        .ok()
        .unwrap_or("sessionId".to_string())
});

/// Longest session lifetime accepted, in seconds (400 days, the browser cap
/// on cookie lifetimes).
pub const MAX_SESSION_MAX_AGE: u64 = 400 * 24 * 60 * 60;

pub static SESSION_COOKIE_MAX_AGE: LazyLock<u64> = LazyLock::new(|| {
    let max_age = std::env::var("SESSION_COOKIE_MAX_AGE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30 * 24 * 60 * 60); // Default to 30 days if not set or invalid
    clamp_max_age(max_age)
});

pub(crate) fn clamp_max_age(max_age: u64) -> u64 {
    if max_age > MAX_SESSION_MAX_AGE {
        tracing::warn!(
            "Max age {} exceeds {} seconds, capping",
            max_age,
            MAX_SESSION_MAX_AGE
        );
    }
    max_age.min(MAX_SESSION_MAX_AGE)
}

pub static SESSION_DURABILITY_MAX_ATTEMPTS: LazyLock<u32> = LazyLock::new(|| {
    std::env::var("SESSION_DURABILITY_MAX_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5)
});

pub static SESSION_DURABILITY_INITIAL_DELAY_MS: LazyLock<u64> = LazyLock::new(|| {
    std::env::var("SESSION_DURABILITY_INITIAL_DELAY_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(50)
});

/// Settings handed to [`SessionManager`](super::SessionManager).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Session lifetime in seconds, used for both the cookie and the store ttl.
    pub max_age: u64,
    pub durability: DurabilityPolicy,
    pub cookie_security: CookieSecurity,
}

impl SessionConfig {
    /// Configuration assembled from the environment, with defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            cookie_name: SESSION_COOKIE_NAME.clone(),
            max_age: *SESSION_COOKIE_MAX_AGE,
            durability: DurabilityPolicy::new(
                *SESSION_DURABILITY_MAX_ATTEMPTS,
                Duration::from_millis(*SESSION_DURABILITY_INITIAL_DELAY_MS),
            ),
            cookie_security: APP_ENV.cookie_security(),
        }
    }
}

impl SessionConfig {
    /// `Max-Age` for the session cookie, capped at [`MAX_SESSION_MAX_AGE`].
    pub(crate) fn cookie_max_age(&self) -> i64 {
        self.max_age.min(MAX_SESSION_MAX_AGE) as i64
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sessionId".to_string(),
            max_age: 30 * 24 * 60 * 60,
            durability: DurabilityPolicy::default(),
            cookie_security: CookieSecurity::Relaxed,
        }
    }
}
