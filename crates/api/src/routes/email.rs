//! One-time code request endpoint

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;

use crate::{
    auth::{validate::is_valid_email, CodePurpose},
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
    pub purpose: String,
}

/// Issue a one-time code for `email` and mail it out.
///
/// Issuance is throttled per address by the email-code limiter, independent
/// of the general per-IP limiter.
pub async fn send_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let email = req.email.trim().to_lowercase();

    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }
    let purpose = CodePurpose::from_str(&req.purpose)
        .map_err(|_| ApiError::Validation("Invalid purpose".to_string()))?;

    // Purpose-specific existence checks: a register code is pointless for an
    // existing account, reset and profile codes for a missing one
    let exists: Option<(bool,)> =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&email)
            .fetch_optional(&state.pool)
            .await?;
    let exists = exists.map(|r| r.0).unwrap_or(false);

    match purpose {
        CodePurpose::Register if exists => return Err(ApiError::EmailAlreadyExists),
        CodePurpose::Reset | CodePurpose::Profile if !exists => return Err(ApiError::NotFound),
        _ => {}
    }

    let decision = state.email_limiter.admit(&email).await;
    if !decision.allowed {
        tracing::warn!(email = %email, "Email code request rate limited");
        return Err(ApiError::RateLimited {
            retry_after_seconds: decision.retry_after_seconds.unwrap_or(60),
        });
    }

    let code = state.email_codes.issue(&email, purpose).await?;

    // Fire and forget: a slow or failing mail provider must not block the
    // response. Failures are logged inside the mailer.
    let mailer = state.mailer.clone();
    tokio::spawn(async move {
        mailer.send_verification_code(&email, &code, purpose).await;
    });

    Ok(Json(json!({ "message": "Verification code sent" })))
}
