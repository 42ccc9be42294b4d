use thiserror::Error;

use crate::storage::StorageError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// The store rejected a read or write. Fatal to the current operation.
    #[error("Session store error: {0}")]
    Store(#[from] StorageError),

    /// The session was written but never became visible to readers.
    #[error("Session {session_id} not found in store after {attempts} attempts")]
    NotDurable { session_id: String, attempts: u32 },

    /// The configured lifetime cannot be represented as an expiry time.
    #[error("Session lifetime of {0} seconds is out of range")]
    InvalidTtl(u64),

    #[error("Corrupt session record: {0}")]
    Corrupt(String),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}
