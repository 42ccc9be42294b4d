mod config;
mod errors;
mod exemption;
mod gate;
mod token;

pub use config::{CSRF_COOKIE_NAME, CSRF_HEADER_NAME, CsrfConfig, MIN_SECRET_LEN};
pub use errors::CsrfError;
pub use exemption::{ExemptionPolicy, ExemptionRule};
pub use gate::{CsrfGate, GateOutcome, IssuedToken};
pub use token::{derive_token, verify_token};
