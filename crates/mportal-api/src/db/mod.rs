//! # Database Persistence Layer
//!
//! Postgres write-through for the in-memory stores. The database is
//! optional: without `DATABASE_URL` the service runs in-memory only.
//!
//! Migrations under `migrations/` are embedded at compile time and run
//! on startup.

pub mod call_logs;
pub mod submissions;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect to Postgres from `DATABASE_URL` and run pending migrations.
///
/// Returns `Ok(None)` when `DATABASE_URL` is unset.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::warn!("DATABASE_URL not set; running with in-memory storage only");
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

    tracing::info!("database connected and migrations applied");
    Ok(Some(pool))
}

/// Decode failure for a column whose stored text no longer parses.
pub(crate) fn decode_error(column: &str, value: &str) -> sqlx::Error {
    sqlx::Error::Decode(
        format!("unrecognized value {value:?} in column {column}").into(),
    )
}
