//! Route paths and response settings for the session router

use std::sync::LazyLock;

pub(crate) const CSRF_TOKEN_PATH: &str = "/api/csrf-token";
pub(crate) const CSRF_TOKEN_INIT_PATH: &str = "/api/csrf-token-init";
pub(crate) const LOGIN_PATH: &str = "/api/auth/login";
pub(crate) const REGISTER_PATH: &str = "/api/auth/register";
pub(crate) const LOGOUT_PATH: &str = "/api/auth/logout";
pub(crate) const ME_PATH: &str = "/api/auth/me";

/// Whether rejected requests log the client address.
/// Default: true
pub static STOREFRONT_LOG_REJECTED_CLIENTS: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("STOREFRONT_LOG_REJECTED_CLIENTS")
        .map(|val| val.to_lowercase() != "false")
        .unwrap_or(true)
});

#[cfg(test)]
mod tests {
    use super::*;

    fn get_log_rejected_clients(env_value: Option<&str>) -> bool {
        env_value
            .map(|val| val.to_lowercase() != "false")
            .unwrap_or(true)
    }

    #[test]
    fn test_log_rejected_clients_default() {
        assert!(get_log_rejected_clients(None));
    }

    #[test]
    fn test_log_rejected_clients_false() {
        assert!(!get_log_rejected_clients(Some("FALSE")));
    }

    #[test]
    fn test_exempt_paths_match_routes() {
        let policy = storefront_session::ExemptionPolicy::storefront_default();
        assert!(policy.is_exempt(&http::Method::POST, LOGIN_PATH));
        assert!(policy.is_exempt(&http::Method::POST, REGISTER_PATH));
        assert!(policy.is_exempt(&http::Method::GET, CSRF_TOKEN_INIT_PATH));
        assert!(!policy.is_exempt(&http::Method::POST, LOGOUT_PATH));
        assert!(!policy.is_exempt(&http::Method::GET, CSRF_TOKEN_PATH));
        assert!(!policy.is_exempt(&http::Method::GET, ME_PATH));
    }
}
