mod cookie;
mod retry;
mod session;

pub use retry::{DurabilityPolicy, RetryOutcome, Sleeper, TokioSleeper, retry_until_found};
pub use session::SessionManager;
