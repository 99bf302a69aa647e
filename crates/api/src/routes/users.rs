//! User listing for interviewers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use joinhub_shared::{ApplicantStatus, Role, User};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    /// `User` serialization skips the password hash
    pub users: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// List accounts, optionally filtered by role and pipeline status.
/// Reached only through the session gate plus the interviewer gate.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<ListUsersResponse>> {
    let role = query
        .role
        .as_deref()
        .map(Role::from_str)
        .transpose()
        .map_err(|_| ApiError::Validation("Invalid role filter".to_string()))?;
    let status = query
        .status
        .as_deref()
        .map(ApplicantStatus::from_str)
        .transpose()
        .map_err(|_| ApiError::Validation("Invalid status filter".to_string()))?;

    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * page_size;

    let users: Vec<User> = sqlx::query_as(
        r#"
        SELECT * FROM users
        WHERE ($1::varchar IS NULL OR role = $1)
          AND ($2::varchar IS NULL OR status = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(role.map(|r| r.to_string()))
    .bind(status.map(|s| s.to_string()))
    .bind(page_size)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM users
        WHERE ($1::varchar IS NULL OR role = $1)
          AND ($2::varchar IS NULL OR status = $2)
        "#,
    )
    .bind(role.map(|r| r.to_string()))
    .bind(status.map(|s| s.to_string()))
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ListUsersResponse {
        users,
        total,
        page,
        page_size,
    }))
}
