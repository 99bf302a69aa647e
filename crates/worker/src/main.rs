//! JoinHub background worker
//!
//! Runs the periodic maintenance jobs that keep the auth tables tidy.
//! Currently a single job: sweeping stale one-time email codes every
//! 30 minutes. Failures are logged and never escalate; the next tick
//! simply tries again.

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use joinhub_api::auth::EmailCodeStore;
use joinhub_shared::create_pool;

const SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "joinhub_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;

    let store = EmailCodeStore::new(pool);

    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "JoinHub worker started"
    );

    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        match store.sweep().await {
            Ok(deleted) => {
                tracing::debug!(deleted, "Email code sweep complete");
            }
            Err(e) => {
                tracing::error!(error = %e, "Email code sweep failed");
            }
        }
    }
}
