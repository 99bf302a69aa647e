//! One-time email verification codes
//!
//! Short numeric-free hex codes mailed to an address to prove ownership
//! before registration, password reset, or profile-sensitive changes. At
//! most one unconsumed code exists per (email, purpose): issuing a new one
//! replaces the old.

use sqlx::PgPool;
use time::{Duration, OffsetDateTime};

/// Codes are valid for five minutes from issue
const CODE_TTL_MINUTES: i64 = 5;

/// What the code authorizes once consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePurpose {
    Register,
    Reset,
    Profile,
}

impl CodePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodePurpose::Register => "register",
            CodePurpose::Reset => "reset",
            CodePurpose::Profile => "profile",
        }
    }
}

impl std::str::FromStr for CodePurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register" => Ok(CodePurpose::Register),
            "reset" => Ok(CodePurpose::Reset),
            "profile" => Ok(CodePurpose::Profile),
            _ => Err(format!("Invalid code purpose: {}", s)),
        }
    }
}

/// Issues, checks and consumes one-time email codes
#[derive(Clone)]
pub struct EmailCodeStore {
    pool: PgPool,
}

impl EmailCodeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Generate a 6-character hex code (3 random bytes)
    fn generate_code() -> String {
        use rand::RngCore;
        let mut bytes = [0u8; 3];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Issue a fresh code for (email, purpose), replacing any earlier one.
    ///
    /// Returns the raw code to send to the user.
    pub async fn issue(&self, email: &str, purpose: CodePurpose) -> Result<String, sqlx::Error> {
        let code = Self::generate_code();
        let expires_at = OffsetDateTime::now_utc() + Duration::minutes(CODE_TTL_MINUTES);

        let mut tx = self.pool.begin().await?;

        // One live code per (email, purpose): drop the predecessor first
        sqlx::query(
            r#"
            DELETE FROM email_codes
            WHERE email = $1 AND purpose = $2
            "#,
        )
        .bind(email)
        .bind(purpose.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO email_codes (email, code, purpose, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(email)
        .bind(&code)
        .bind(purpose.as_str())
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            email = %email,
            purpose = %purpose.as_str(),
            expires_at = %expires_at,
            "Email code issued"
        );

        Ok(code)
    }

    /// Check whether `code` is currently valid for (email, purpose) without
    /// consuming it. Used for multi-step flows that verify early and consume
    /// at the final step.
    pub async fn check(
        &self,
        email: &str,
        purpose: CodePurpose,
        code: &str,
    ) -> Result<(), CodeError> {
        let found: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT 1
            FROM email_codes
            WHERE email = $1 AND purpose = $2 AND code = $3
              AND used_at IS NULL AND expires_at > NOW()
            "#,
        )
        .bind(email)
        .bind(purpose.as_str())
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(CodeError::Database)?;

        match found {
            Some(_) => Ok(()),
            None => Err(CodeError::Invalid),
        }
    }

    /// Atomically consume `code` for (email, purpose). A code that is
    /// unknown, expired or already consumed fails identically; two
    /// concurrent consumers cannot both succeed.
    pub async fn consume(
        &self,
        email: &str,
        purpose: CodePurpose,
        code: &str,
    ) -> Result<(), CodeError> {
        let result = sqlx::query(
            r#"
            UPDATE email_codes
            SET used_at = NOW()
            WHERE email = $1 AND purpose = $2 AND code = $3
              AND used_at IS NULL AND expires_at > NOW()
            "#,
        )
        .bind(email)
        .bind(purpose.as_str())
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(CodeError::Database)?;

        if result.rows_affected() == 0 {
            tracing::warn!(
                email = %email,
                purpose = %purpose.as_str(),
                "Rejected invalid or expired email code"
            );
            return Err(CodeError::Invalid);
        }

        tracing::info!(
            email = %email,
            purpose = %purpose.as_str(),
            "Email code consumed"
        );

        Ok(())
    }

    /// Delete expired codes (run periodically via background job). Consumed
    /// rows are not swept here; they expire within minutes and issuing a new
    /// code for the same (email, purpose) removes them anyway.
    pub async fn sweep(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM email_codes
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            tracing::info!(count = deleted, "Swept stale email codes");
        }

        Ok(deleted)
    }
}

/// Code validation errors
#[derive(Debug, thiserror::Error)]
pub enum CodeError {
    #[error("Invalid or expired code")]
    Invalid,
    #[error("Database error")]
    Database(#[source] sqlx::Error),
}
