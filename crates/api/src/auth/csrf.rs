//! CSRF double-submit tokens
//!
//! Each login mints a random token set both as a readable cookie and in the
//! response body. Mutating requests must echo it back in the `X-CSRF-Token`
//! header; the session gate compares header and cookie in constant time.

use rand::RngCore;
use subtle::ConstantTimeEq;

/// Generate a 32-byte random CSRF token, hex encoded
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time comparison of the header token against the cookie token
pub fn csrf_matches(header_token: &str, cookie_token: &str) -> bool {
    header_token
        .as_bytes()
        .ct_eq(cookie_token.as_bytes())
        .into()
}
