use thiserror::Error;

use crate::session::SessionError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum CsrfError {
    /// The caller has a live, identified session but sent a stale or missing
    /// token. Carries a token derived for that session so the client can retry.
    #[error("Security token is stale. Please try again.")]
    Mismatch { fresh_token: String },

    /// No identified session behind the request. The client must log in again.
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error("Invalid CSRF secret: {0}")]
    InvalidSecret(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn test_error_messages() {
        let mismatch = CsrfError::Mismatch {
            fresh_token: "t".to_string(),
        };
        assert_eq!(
            mismatch.to_string(),
            "Security token is stale. Please try again."
        );
        assert_eq!(
            CsrfError::SessionExpired.to_string(),
            "Session expired. Please log in again."
        );
    }

    #[test]
    fn test_from_session_error() {
        let err: CsrfError =
            SessionError::Store(StorageError::Storage("down".to_string())).into();
        assert!(matches!(err, CsrfError::Session(SessionError::Store(_))));
    }
}
