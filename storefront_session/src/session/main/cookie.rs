use headers::HeaderMapExt;
use http::HeaderMap;

use crate::session::config::SessionConfig;
use crate::session::errors::SessionError;
use crate::utils::{header_clear_cookie, header_set_cookie};

/// `Set-Cookie` for a freshly established session id.
pub(super) fn session_cookie_headers(
    config: &SessionConfig,
    session_id: &str,
) -> Result<HeaderMap, SessionError> {
    let mut headers = HeaderMap::new();
    header_set_cookie(
        &mut headers,
        &config.cookie_name,
        session_id,
        config.cookie_max_age(),
        true,
        config.cookie_security,
    )?;
    tracing::debug!("Session cookie '{}' set", config.cookie_name);
    Ok(headers)
}

pub(super) fn append_clear_session_cookie(
    config: &SessionConfig,
    headers: &mut HeaderMap,
) -> Result<(), SessionError> {
    header_clear_cookie(headers, &config.cookie_name, config.cookie_security)?;
    Ok(())
}

/// The session id carried by the request's `Cookie` header, if any.
pub(super) fn session_id_from_headers(config: &SessionConfig, headers: &HeaderMap) -> Option<String> {
    let Some(cookies) = headers.typed_get::<headers::Cookie>() else {
        tracing::trace!("No cookie header found");
        return None;
    };

    match cookies.get(&config.cookie_name) {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => {
            tracing::trace!("No session cookie '{}' found in cookies", config.cookie_name);
            None
        }
    }
}
