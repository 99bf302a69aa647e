//! Authentication routes

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use joinhub_shared::{Role, User};

use crate::{
    auth::{
        generate_csrf_token, hash_password,
        validate::{is_valid_email, is_valid_nickname},
        validate_password, verify_password, AuthUser, CodePurpose,
    },
    auth::middleware::{CSRF_COOKIE, SESSION_COOKIE},
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address or nickname
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: String,
    pub nickname: String,
    pub signature: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub csrf_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

// =============================================================================
// Cookie Helpers
// =============================================================================

/// Build the session and CSRF Set-Cookie headers. The session cookie is
/// HttpOnly; the CSRF cookie must stay readable so the client can echo it in
/// the `X-CSRF-Token` header.
fn session_cookies(token: &str, csrf_token: &str, max_age: i64) -> ApiResult<[HeaderValue; 2]> {
    let session = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Strict",
        SESSION_COOKIE, token, max_age
    );
    let csrf = format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Strict",
        CSRF_COOKIE, csrf_token, max_age
    );

    Ok([
        HeaderValue::from_str(&session).map_err(|_| ApiError::Internal)?,
        HeaderValue::from_str(&csrf).map_err(|_| ApiError::Internal)?,
    ])
}

fn with_cookies(status: StatusCode, cookies: [HeaderValue; 2], body: AuthResponse) -> Response {
    let mut response = (status, Json(body)).into_response();
    for cookie in cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

/// Issue session + CSRF tokens for `user` and wrap them in a response with
/// both cookies set
fn establish_session(state: &AppState, user: User, status: StatusCode) -> ApiResult<Response> {
    let token = state.codec.issue(user.id, &user.email, user.role)?;
    let csrf_token = generate_csrf_token();
    let expires_in = state.codec.ttl_seconds();

    let cookies = session_cookies(&token, &csrf_token, expires_in)?;
    Ok(with_cookies(
        status,
        cookies,
        AuthResponse {
            token,
            csrf_token,
            token_type: "Bearer".to_string(),
            expires_in,
            user,
        },
    ))
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account, gated on a mailed one-time code
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Response> {
    let email = req.email.trim().to_lowercase();

    // Verify the code up front without consuming it, so a typo elsewhere in
    // the form does not burn the code
    state
        .email_codes
        .check(&email, CodePurpose::Register, &req.code)
        .await?;

    if !is_valid_nickname(&req.nickname) {
        return Err(ApiError::Validation(
            "Nickname must be 1-32 characters of letters, digits, '_' or '-'".to_string(),
        ));
    }
    validate_password(&req.password).map_err(|e| ApiError::Validation(e.to_string()))?;

    // Uniqueness pre-checks for friendly errors; the DB UNIQUE constraints
    // remain the real guard against races
    let email_taken: Option<(bool,)> =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&email)
            .fetch_optional(&state.pool)
            .await?;
    if email_taken.map(|r| r.0).unwrap_or(false) {
        return Err(ApiError::EmailAlreadyExists);
    }

    let nickname_taken: Option<(bool,)> =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE nickname = $1)")
            .bind(&req.nickname)
            .fetch_optional(&state.pool)
            .await?;
    if nickname_taken.map(|r| r.0).unwrap_or(false) {
        return Err(ApiError::NicknameAlreadyExists);
    }

    // All validation passed; spend the code
    state
        .email_codes
        .consume(&email, CodePurpose::Register, &req.code)
        .await?;

    let password_hash = hash_password(&req.password)?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, nickname, signature, password_hash, role, status)
        VALUES ($1, $2, $3, '', $4, 'interviewee', 'r1_pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&req.nickname)
    .bind(&password_hash)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(user_id = %user.id, "Account registered");

    establish_session(&state, user, StatusCode::CREATED)
}

/// Log in with email or nickname
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    let identifier = req.identifier.trim();

    let user: Option<User> = sqlx::query_as(
        r#"
        SELECT * FROM users
        WHERE email = $1 OR nickname = $2
        "#,
    )
    .bind(identifier.to_lowercase())
    .bind(identifier)
    .fetch_optional(&state.pool)
    .await?;

    // Same error for unknown account and wrong password
    let user = user.ok_or(ApiError::InvalidCredentials)?;
    if !verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(ApiError::InvalidCredentials);
    }

    tracing::info!(user_id = %user.id, "User logged in");

    establish_session(&state, user, StatusCode::OK)
}

/// Log out by clearing both cookies. Tokens are not revocable server-side;
/// a captured bearer token stays valid until expiry.
pub async fn logout() -> ApiResult<Response> {
    let cleared = session_cookies("", "", 0)?;
    let mut response = (
        StatusCode::OK,
        Json(json!({ "message": "Logged out" })),
    )
        .into_response();
    for cookie in cleared {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    Ok(response)
}

/// Reset a forgotten password using a mailed one-time code
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let email = req.email.trim().to_lowercase();

    state
        .email_codes
        .check(&email, CodePurpose::Reset, &req.code)
        .await?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;
    let user = user.ok_or(ApiError::NotFound)?;

    validate_password(&req.new_password).map_err(|e| ApiError::Validation(e.to_string()))?;

    state
        .email_codes
        .consume(&email, CodePurpose::Reset, &req.code)
        .await?;

    let password_hash = hash_password(&req.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(&password_hash)
        .bind(user.id)
        .execute(&state.pool)
        .await?;

    tracing::info!(user_id = %user.id, "Password reset via email code");

    Ok(Json(json!({ "message": "Password updated" })))
}

/// Return the authenticated caller's identity from the session claims
pub async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: user.id,
        email: user.email,
        role: user.role,
    })
}

/// Change password for the authenticated user
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let record: Option<(String,)> = sqlx::query_as("SELECT password_hash FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_optional(&state.pool)
        .await?;
    let (password_hash,) = record.ok_or(ApiError::NotFound)?;

    if !verify_password(&req.current_password, &password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    validate_password(&req.new_password).map_err(|e| ApiError::Validation(e.to_string()))?;

    let new_hash = hash_password(&req.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(&new_hash)
        .bind(user.id)
        .execute(&state.pool)
        .await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(Json(json!({ "message": "Password updated" })))
}

/// Update email, nickname and signature for the authenticated user.
///
/// The one-time code is tied to the submitted email address, so changing
/// the address requires proving control of the new one.
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let email = req.email.trim().to_lowercase();

    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }
    if !is_valid_nickname(&req.nickname) {
        return Err(ApiError::Validation(
            "Nickname must be 1-32 characters of letters, digits, '_' or '-'".to_string(),
        ));
    }

    // Verify the code up front without consuming it, so a conflict below
    // does not burn it
    state
        .email_codes
        .check(&email, CodePurpose::Profile, &req.code)
        .await?;

    let current: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_optional(&state.pool)
        .await?;
    let current = current.ok_or(ApiError::NotFound)?;

    // Uniqueness pre-checks exclude the caller's own row; the DB UNIQUE
    // constraints remain the real guard against races
    if current.email != email {
        let taken: Option<(bool,)> = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id != $2)",
        )
        .bind(&email)
        .bind(user.id)
        .fetch_optional(&state.pool)
        .await?;
        if taken.map(|r| r.0).unwrap_or(false) {
            return Err(ApiError::EmailAlreadyExists);
        }
    }

    if current.nickname.as_deref() != Some(req.nickname.as_str()) {
        let taken: Option<(bool,)> = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE nickname = $1 AND id != $2)",
        )
        .bind(&req.nickname)
        .bind(user.id)
        .fetch_optional(&state.pool)
        .await?;
        if taken.map(|r| r.0).unwrap_or(false) {
            return Err(ApiError::NicknameAlreadyExists);
        }
    }

    // All validation passed; spend the code
    state
        .email_codes
        .consume(&email, CodePurpose::Profile, &req.code)
        .await?;

    sqlx::query(
        r#"
        UPDATE users
        SET email = $1, nickname = $2, signature = $3, updated_at = NOW()
        WHERE id = $4
        "#,
    )
    .bind(&email)
    .bind(&req.nickname)
    .bind(&req.signature)
    .bind(user.id)
    .execute(&state.pool)
    .await?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(json!({ "message": "Profile updated" })))
}
