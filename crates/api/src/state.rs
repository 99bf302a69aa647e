//! Shared application state

use std::sync::Arc;

use joinhub_shared::RateLimiter;
use sqlx::PgPool;

use crate::auth::{EmailCodeStore, TokenCodec};
use crate::config::Config;
use crate::email::Mailer;

/// State handed to every handler and middleware layer. Cloning is cheap;
/// all fields are handles.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub codec: TokenCodec,
    pub email_codes: EmailCodeStore,
    pub mailer: Mailer,
    /// Per-client-IP throttle for all API traffic
    pub general_limiter: RateLimiter,
    /// Per-address throttle for one-time code delivery
    pub email_limiter: RateLimiter,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config, mailer: Mailer) -> Self {
        let codec = TokenCodec::new(&config.token_secret, config.token_ttl_hours);
        let email_codes = EmailCodeStore::new(pool.clone());
        let general_limiter = RateLimiter::new(
            config.rate_limit_general_rate,
            config.rate_limit_general_burst,
        );
        let email_limiter =
            RateLimiter::new(config.rate_limit_email_rate, config.rate_limit_email_burst);

        Self {
            pool,
            config: Arc::new(config),
            codec,
            email_codes,
            mailer,
            general_limiter,
            email_limiter,
        }
    }
}
