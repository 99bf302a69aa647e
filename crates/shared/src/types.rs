//! Common types used across JoinHub

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Account role. Closed set: every authorization decision matches exhaustively
/// on these two variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Interviewee,
    Interviewer,
}

impl Default for Role {
    fn default() -> Self {
        Self::Interviewee
    }
}

impl Role {
    pub fn is_interviewer(&self) -> bool {
        matches!(self, Self::Interviewer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interviewee => write!(f, "interviewee"),
            Self::Interviewer => write!(f, "interviewer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "interviewee" => Ok(Self::Interviewee),
            "interviewer" => Ok(Self::Interviewer),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Progress of an applicant through the interview pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    R1Pending,
    R1Passed,
    R2Pending,
    R2Passed,
    Rejected,
    Offer,
}

impl Default for ApplicantStatus {
    fn default() -> Self {
        Self::R1Pending
    }
}

impl std::fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::R1Pending => write!(f, "r1_pending"),
            Self::R1Passed => write!(f, "r1_passed"),
            Self::R2Pending => write!(f, "r2_pending"),
            Self::R2Passed => write!(f, "r2_passed"),
            Self::Rejected => write!(f, "rejected"),
            Self::Offer => write!(f, "offer"),
        }
    }
}

impl std::str::FromStr for ApplicantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r1_pending" => Ok(Self::R1Pending),
            "r1_passed" => Ok(Self::R1Passed),
            "r2_pending" => Ok(Self::R2Pending),
            "r2_passed" => Ok(Self::R2Passed),
            "rejected" => Ok(Self::Rejected),
            "offer" => Ok(Self::Offer),
            _ => Err(format!("Invalid applicant status: {}", s)),
        }
    }
}

// =============================================================================
// Database Models
// =============================================================================

/// User model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub nickname: Option<String>,
    pub signature: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: ApplicantStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_default() {
        assert_eq!(Role::default(), Role::Interviewee);
    }

    #[test]
    fn test_role_display_and_parse() {
        assert_eq!(format!("{}", Role::Interviewee), "interviewee");
        assert_eq!(format!("{}", Role::Interviewer), "interviewer");
        assert_eq!("interviewer".parse::<Role>().unwrap(), Role::Interviewer);
        assert_eq!("INTERVIEWEE".parse::<Role>().unwrap(), Role::Interviewee);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_is_interviewer() {
        assert!(Role::Interviewer.is_interviewer());
        assert!(!Role::Interviewee.is_interviewer());
    }

    #[test]
    fn test_applicant_status_round_trip() {
        for status in [
            ApplicantStatus::R1Pending,
            ApplicantStatus::R1Passed,
            ApplicantStatus::R2Pending,
            ApplicantStatus::R2Passed,
            ApplicantStatus::Rejected,
            ApplicantStatus::Offer,
        ] {
            let s = format!("{}", status);
            assert_eq!(s.parse::<ApplicantStatus>().unwrap(), status);
        }
        assert!("hired".parse::<ApplicantStatus>().is_err());
    }
}
