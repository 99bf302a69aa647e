//! Application configuration

use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Database
    pub database_url: String,

    // Authentication
    pub token_secret: String,
    pub token_ttl_hours: i64,

    // Rate limiting (tokens per second / burst per limiter instance)
    pub rate_limit_general_rate: f64,
    pub rate_limit_general_burst: u32,
    pub rate_limit_email_rate: f64,
    pub rate_limit_email_burst: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,

            // Authentication
            token_secret: {
                let secret =
                    env::var("TOKEN_SECRET").map_err(|_| ConfigError::Missing("TOKEN_SECRET"))?;
                // Session tokens are only as strong as the signing key
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "TOKEN_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            // 7 days by default
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()
                .unwrap_or(168),

            // General per-IP limiter: 5 req/s recovered, burst of 10
            rate_limit_general_rate: env::var("RATE_LIMIT_GENERAL_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5.0),
            rate_limit_general_burst: env::var("RATE_LIMIT_GENERAL_BURST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            // Email-code limiter keyed by address: one send per minute
            rate_limit_email_rate: env::var("RATE_LIMIT_EMAIL_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0 / 60.0),
            rate_limit_email_burst: env::var("RATE_LIMIT_EMAIL_BURST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}
