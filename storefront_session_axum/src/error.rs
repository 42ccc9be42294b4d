use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, StatusCode};
use serde_json::{Value, json};

use storefront_session::{CsrfError, CsrfGate, SessionError};

use super::auth::AuthError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// JSON error response: `{"message": ...}` plus any extra fields and headers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
    headers: HeaderMap,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "message": message.into() }),
            headers: HeaderMap::new(),
        }
    }

    pub(crate) fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Not authenticated")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Map a gate rejection. A mismatch carries the fresh token; an expired
    /// session clears the session and CSRF cookies.
    pub(crate) fn from_csrf(err: CsrfError, gate: &CsrfGate) -> Self {
        match err {
            CsrfError::Mismatch { ref fresh_token } => Self {
                status: StatusCode::FORBIDDEN,
                body: json!({ "message": err.to_string(), "csrfToken": fresh_token }),
                headers: HeaderMap::new(),
            },
            CsrfError::SessionExpired => match gate.expiry_cookie_headers() {
                Ok(headers) => Self {
                    headers,
                    ..Self::new(StatusCode::UNAUTHORIZED, err.to_string())
                },
                Err(e) => {
                    tracing::error!("Failed to build cookie clearing headers: {}", e);
                    Self::new(StatusCode::UNAUTHORIZED, err.to_string())
                }
            },
            other => other.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.headers, Json(self.body)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotDurable { .. } => {
                tracing::warn!("{}", err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Could not establish session. Please try again.",
                )
            }
            _ => {
                tracing::error!("{}", err);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
            }
        }
    }
}

impl From<CsrfError> for ApiError {
    fn from(err: CsrfError) -> Self {
        match err {
            CsrfError::Mismatch { .. } => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            CsrfError::SessionExpired => Self::new(StatusCode::UNAUTHORIZED, err.to_string()),
            CsrfError::Session(e) => e.into(),
            CsrfError::InvalidSecret(_) | CsrfError::Utils(_) => {
                tracing::error!("{}", err);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match err {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::Invalid(_) => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => {
                tracing::error!("{}", err);
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE);
            }
        };
        Self::new(status, err.to_string())
    }
}

/// Helper trait for converting errors to a JSON error response
pub(crate) trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, ApiError>;
}

impl<T, E> IntoResponseError<T> for Result<T, E>
where
    E: Into<ApiError>,
{
    fn into_response_error(self) -> Result<T, ApiError> {
        self.map_err(Into::into)
    }
}
