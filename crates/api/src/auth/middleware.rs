//! Session gate middleware
//!
//! Authenticates every protected request: a session token arrives either as
//! an `Authorization: Bearer` header (API clients) or a `session_id` cookie
//! (browsers). Mutating requests must additionally pass the CSRF
//! double-submit check.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use joinhub_shared::Role;

use crate::auth::csrf::csrf_matches;
use crate::error::ApiError;
use crate::state::AppState;

/// Cookie carrying the session token for browser clients
pub const SESSION_COOKIE: &str = "session_id";
/// Readable cookie carrying the CSRF token
pub const CSRF_COOKIE: &str = "csrf_token";
/// Header echoing the CSRF cookie on mutating requests
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Authenticated caller, inserted as a request extension by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}

/// Pull a named cookie value out of the Cookie header
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Methods that can change state and therefore need CSRF proof
fn is_mutating(method: &Method) -> bool {
    !matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Authentication middleware for protected routes
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers();

    let token = match bearer_token(headers) {
        Some(token) => token.to_string(),
        None => match cookie_value(headers, SESSION_COOKIE) {
            Some(token) => token.to_string(),
            None => return Err(ApiError::Unauthenticated),
        },
    };

    let claims = state.codec.verify(&token)?;

    if is_mutating(request.method()) {
        let header_token = headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::CsrfMissing)?;
        let cookie_token = cookie_value(headers, CSRF_COOKIE).ok_or(ApiError::CsrfMissing)?;

        if !csrf_matches(header_token, cookie_token) {
            tracing::warn!(user_id = %claims.sub, "CSRF token mismatch");
            return Err(ApiError::CsrfInvalid);
        }
    }

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Authorization middleware restricting a route group to interviewers.
/// Must run after [`require_auth`].
pub async fn require_interviewer(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(ApiError::Unauthenticated)?;

    if !user.role.is_interviewer() {
        tracing::warn!(user_id = %user.id, "Rejected non-interviewer access");
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}
