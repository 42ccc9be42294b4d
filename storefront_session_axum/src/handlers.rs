use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, StatusCode};
use serde_json::json;

use super::auth::{Credentials, Identity, Registration};
use super::error::{ApiError, IntoResponseError};
use super::session::SessionUser;
use super::state::SessionState;

/// `{"csrfToken": ...}` for the caller's session, mirrored in the CSRF cookie.
pub(crate) async fn csrf_token(
    State(state): State<SessionState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let issued = state.gate.issue_token(&headers).await.into_response_error()?;
    if !issued.established {
        tracing::debug!("Issued CSRF token without an established session");
    }
    Ok((issued.headers, Json(json!({ "csrfToken": issued.token }))).into_response())
}

pub(crate) async fn login(
    State(state): State<SessionState>,
    headers: HeaderMap,
    Json(credentials): Json<Credentials>,
) -> Result<Response, ApiError> {
    let identity = state
        .authenticator
        .login(&credentials)
        .await
        .inspect_err(|e| tracing::warn!("Login failed for {}: {}", credentials.username, e))
        .into_response_error()?;

    establish(&state, &headers, identity, StatusCode::OK).await
}

pub(crate) async fn register(
    State(state): State<SessionState>,
    headers: HeaderMap,
    Json(registration): Json<Registration>,
) -> Result<Response, ApiError> {
    let identity = state
        .authenticator
        .register(&registration)
        .await
        .into_response_error()?;

    establish(&state, &headers, identity, StatusCode::CREATED).await
}

/// Start a confirmed session for `identity` and answer with the user, a
/// usable CSRF token and both cookies.
async fn establish(
    state: &SessionState,
    headers: &HeaderMap,
    identity: Identity,
    status: StatusCode,
) -> Result<Response, ApiError> {
    let sessions = state.sessions();
    let current = sessions.session_id_from_headers(headers);

    let handle = sessions
        .initialize(current.as_deref(), &identity.user_id, identity.roles.iter().cloned())
        .await
        .into_response_error()?;

    let csrf_token = state.gate.token_for(handle.id()).into_response_error()?;

    let mut response_headers = sessions.session_cookie_headers(&handle).into_response_error()?;
    let csrf_headers = state
        .gate
        .token_cookie_headers(&csrf_token)
        .into_response_error()?;
    csrf_headers.iter().for_each(|(key, value)| {
        response_headers.append(key, value.clone());
    });

    Ok((
        status,
        response_headers,
        Json(json!({ "user": identity, "csrfToken": csrf_token })),
    )
        .into_response())
}

pub(crate) async fn logout(
    State(state): State<SessionState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(session_id) = state.sessions().session_id_from_headers(&headers) {
        state
            .sessions()
            .destroy(&session_id)
            .await
            .into_response_error()?;
    }

    let clear = state.gate.expiry_cookie_headers().into_response_error()?;
    Ok((clear, Json(json!({ "message": "Logged out" }))).into_response())
}

pub(crate) async fn me(
    State(state): State<SessionState>,
    user: SessionUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let profile = state
        .authenticator
        .profile(&user.user_id)
        .await
        .into_response_error()?;

    let identity = Identity {
        profile,
        ..Identity::new(user.user_id, user.roles.into_iter().collect())
    };
    Ok(Json(json!({ "user": identity })))
}
