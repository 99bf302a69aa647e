//! Request throttling middleware
//!
//! Applies the general per-IP token bucket to the whole API surface and
//! reports quota through `X-RateLimit-*` response headers.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use joinhub_shared::RateLimitDecision;
use std::net::SocketAddr;

use crate::error::ApiError;
use crate::routes::extract_client_ip;
use crate::state::AppState;

pub async fn throttle(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Proxy headers first, socket peer as fallback
    let client_ip = extract_client_ip(request.headers()).or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip().to_string())
    });

    let Some(client_ip) = client_ip else {
        // No attributable client; pass through rather than throttle blindly
        return Ok(next.run(request).await);
    };

    let decision = state.general_limiter.admit(&client_ip).await;

    if !decision.allowed {
        tracing::warn!(client_ip = %client_ip, "Request rate limited");
        let mut response = ApiError::RateLimited {
            retry_after_seconds: decision.retry_after_seconds.unwrap_or(1),
        }
        .into_response();
        apply_quota_headers(response.headers_mut(), &decision);
        return Ok(response);
    }

    let mut response = next.run(request).await;
    apply_quota_headers(response.headers_mut(), &decision);
    Ok(response)
}

fn apply_quota_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", value);
    }
}
