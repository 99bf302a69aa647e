//! API routes

pub mod auth;
pub mod email;
pub mod health;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderMap,
    middleware,
    routing::{get, post},
    Router,
};

use crate::{
    auth::{require_auth, require_interviewer},
    rate_limit::throttle,
    state::AppState,
};

/// Extract client IP address from request headers.
/// Checks common proxy headers in order of preference.
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("cf-connecting-ip") // Cloudflare
        .or_else(|| headers.get("x-real-ip"))
        .or_else(|| headers.get("x-forwarded-for"))
        .and_then(|h| h.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
}

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level, outside the rate limiter)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Public API routes (no auth required)
    let public_api_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/email/code", post(email::send_code));

    // Protected API routes (session gate)
    let protected_api_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        .route("/auth/profile", post(auth::update_profile))
        .merge(
            // Interviewer-only routes
            Router::new()
                .route("/users", get(users::list_users))
                .route_layer(middleware::from_fn(require_interviewer)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Combine API routes under /api/v2 with the general per-IP limiter
    let api_v2_routes = Router::new()
        .merge(public_api_routes)
        .merge(protected_api_routes)
        .layer(middleware::from_fn_with_state(state.clone(), throttle));

    Router::new()
        .merge(health_routes)
        .nest("/api/v2", api_v2_routes)
        // Global request body size limit
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
        .with_state(state)
}
