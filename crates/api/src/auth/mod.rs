//! Authentication and session control

pub mod csrf;
pub mod email_code;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod validate;

#[cfg(test)]
mod middleware_tests;

pub use csrf::{csrf_matches, generate_csrf_token};
pub use email_code::{CodeError, CodePurpose, EmailCodeStore};
pub use jwt::{Claims, TokenCodec, TokenError};
pub use middleware::{require_auth, require_interviewer, AuthUser};
pub use password::{hash_password, validate_password, verify_password};
