//! Router-level session gate tests
//!
//! These exercise `require_auth` and `require_interviewer` through a real
//! router with `tower::ServiceExt::oneshot`. The database pool is lazy and
//! never touched; handlers under test respond from claims alone.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceExt;
use uuid::Uuid;

use joinhub_shared::Role;

use crate::auth::generate_csrf_token;
use crate::auth::middleware::{require_auth, require_interviewer, AuthUser};
use crate::config::Config;
use crate::email::{EmailConfig, Mailer};
use crate::state::AppState;

const SECRET: &str = "unit-test-secret-key-32-characters!!";

fn test_state() -> AppState {
    let config = Config {
        bind_address: "127.0.0.1:0".to_string(),
        database_url: "postgres://localhost/unused".to_string(),
        token_secret: SECRET.to_string(),
        token_ttl_hours: 168,
        rate_limit_general_rate: 0.0,
        rate_limit_general_burst: 0,
        rate_limit_email_rate: 0.0,
        rate_limit_email_burst: 0,
    };
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();
    let mailer = Mailer::new(EmailConfig {
        resend_api_key: String::new(),
        email_from: "test@localhost".to_string(),
        app_name: "JoinHub".to_string(),
    });
    AppState::new(pool, config, mailer)
}

async fn whoami(user: AuthUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "id": user.id, "role": user.role }))
}

fn test_router(state: AppState) -> Router {
    let interviewer_routes = Router::new()
        .route("/review", get(whoami))
        .route_layer(middleware::from_fn(require_interviewer));

    Router::new()
        .route("/whoami", get(whoami))
        .route("/mutate", post(whoami))
        .merge(interviewer_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

fn issue_token(state: &AppState, role: Role) -> String {
    state
        .codec
        .issue(Uuid::new_v4(), "gate@example.com", role)
        .unwrap()
}

async fn status_of(router: Router, request: Request<Body>) -> StatusCode {
    router.oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn missing_credential_is_unauthenticated() {
    let state = test_state();
    let request = Request::get("/whoami").body(Body::empty()).unwrap();
    assert_eq!(
        status_of(test_router(state), request).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn bearer_token_admits_get() {
    let state = test_state();
    let token = issue_token(&state, Role::Interviewee);
    let request = Request::get("/whoami")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(test_router(state), request).await, StatusCode::OK);
}

#[tokio::test]
async fn session_cookie_admits_get() {
    let state = test_state();
    let token = issue_token(&state, Role::Interviewee);
    let request = Request::get("/whoami")
        .header(header::COOKIE, format!("session_id={}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(test_router(state), request).await, StatusCode::OK);
}

#[tokio::test]
async fn tampered_token_is_invalid() {
    let state = test_state();
    let token = issue_token(&state, Role::Interviewee);
    let request = Request::get("/whoami")
        .header(header::AUTHORIZATION, format!("Bearer {}x", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        status_of(test_router(state), request).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn expired_token_is_distinguished() {
    use axum::body::to_bytes;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use time::{Duration, OffsetDateTime};

    let state = test_state();
    let now = OffsetDateTime::now_utc();
    let claims = crate::auth::Claims {
        sub: Uuid::new_v4(),
        email: "gate@example.com".to_string(),
        role: Role::Interviewee,
        iat: (now - Duration::hours(2)).unix_timestamp(),
        exp: (now - Duration::hours(1)).unix_timestamp(),
        iss: "joinhub".to_string(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let request = Request::get("/whoami")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = test_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn mutating_request_without_csrf_is_rejected() {
    let state = test_state();
    let token = issue_token(&state, Role::Interviewee);
    let request = Request::post("/mutate")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        status_of(test_router(state), request).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn mutating_request_with_mismatched_csrf_is_rejected() {
    let state = test_state();
    let token = issue_token(&state, Role::Interviewee);
    let request = Request::post("/mutate")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header("x-csrf-token", generate_csrf_token())
        .header(
            header::COOKIE,
            format!("csrf_token={}", generate_csrf_token()),
        )
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        status_of(test_router(state), request).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn mutating_request_with_matching_csrf_is_admitted() {
    let state = test_state();
    let token = issue_token(&state, Role::Interviewee);
    let csrf = generate_csrf_token();
    let request = Request::post("/mutate")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header("x-csrf-token", &csrf)
        .header(header::COOKIE, format!("csrf_token={}", csrf))
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(test_router(state), request).await, StatusCode::OK);
}

#[tokio::test]
async fn get_request_needs_no_csrf() {
    let state = test_state();
    let token = issue_token(&state, Role::Interviewee);
    let request = Request::get("/whoami")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(test_router(state), request).await, StatusCode::OK);
}

#[tokio::test]
async fn interviewee_is_forbidden_on_interviewer_route() {
    let state = test_state();
    let token = issue_token(&state, Role::Interviewee);
    let request = Request::get("/review")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        status_of(test_router(state), request).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn interviewer_is_admitted_on_interviewer_route() {
    let state = test_state();
    let token = issue_token(&state, Role::Interviewer);
    let request = Request::get("/review")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(test_router(state), request).await, StatusCode::OK);
}
