use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::utils::{base64url_encode, gen_random_string};

use super::errors::CsrfError;

type HmacSha256 = Hmac<Sha256>;

const TEMP_ID_PREFIX: &str = "temp-";

/// `base64url(HMAC-SHA256(secret, session_id))`, unpadded.
pub fn derive_token(secret: &[u8], session_id: &str) -> Result<String, CsrfError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| CsrfError::InvalidSecret(e.to_string()))?;
    mac.update(session_id.as_bytes());
    Ok(base64url_encode(&mac.finalize().into_bytes()))
}

/// Constant-time comparison of `presented` against the token for `session_id`.
pub fn verify_token(secret: &[u8], session_id: &str, presented: &str) -> Result<bool, CsrfError> {
    let expected = derive_token(secret, session_id)?;
    Ok(expected.as_bytes().ct_eq(presented.as_bytes()).into())
}

/// Identifier for a caller without an established session. Unique per call so
/// anonymous callers never share a token.
pub(crate) fn temporary_session_id() -> Result<String, CsrfError> {
    Ok(format!(
        "{TEMP_ID_PREFIX}{}-{}",
        Utc::now().timestamp_millis(),
        gen_random_string(9)?
    ))
}

/// Temporary identifiers are never written to the store.
pub(crate) fn is_temporary_id(session_id: &str) -> bool {
    session_id.starts_with(TEMP_ID_PREFIX)
}
