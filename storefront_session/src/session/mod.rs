mod config;
mod errors;
mod main;
mod types;

pub(crate) use config::clamp_max_age;
pub use config::{MAX_SESSION_MAX_AGE, SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME, SessionConfig};
pub use errors::SessionError;
pub use main::{
    DurabilityPolicy, RetryOutcome, SessionManager, Sleeper, TokioSleeper, retry_until_found,
};
pub use types::{SessionHandle, StoredSession};
