use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use http::request::Parts;
use std::collections::BTreeSet;

use super::error::{ApiError, IntoResponseError};
use super::state::SessionState;

/// The identified user behind the request's session cookie.
///
/// Rejects with 401 when there is no session, the record is gone, or no user
/// is attached to it.
///
/// ```no_run
/// use storefront_session_axum::SessionUser;
///
/// async fn whoami(user: SessionUser) -> String {
///     format!("Hello, {}!", user.user_id)
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    pub roles: BTreeSet<String>,
    pub session_id: String,
}

impl SessionUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    async fn resolve(parts: &Parts, state: &SessionState) -> Result<Option<Self>, ApiError> {
        let sessions = state.sessions();
        let Some(session_id) = sessions.session_id_from_headers(&parts.headers) else {
            return Ok(None);
        };

        let Some(record) = sessions.load(&session_id).await.into_response_error()? else {
            tracing::debug!("Session cookie without a stored record");
            return Ok(None);
        };

        Ok(record.user_id.map(|user_id| Self {
            user_id,
            roles: record.roles,
            session_id,
        }))
    }
}

impl<S> FromRequestParts<S> for SessionUser
where
    SessionState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = SessionState::from_ref(state);
        Self::resolve(parts, &state)
            .await?
            .ok_or_else(ApiError::unauthorized)
    }
}

impl<S> OptionalFromRequestParts<S> for SessionUser
where
    SessionState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let state = SessionState::from_ref(state);
        Self::resolve(parts, &state).await
    }
}
