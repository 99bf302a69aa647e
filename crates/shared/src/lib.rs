//! JoinHub Shared Types and Utilities
//!
//! This crate contains types and utilities shared across the JoinHub platform.

pub mod db;
pub mod rate_limit;
pub mod types;

pub use db::*;
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use types::*;
