//! # Database Persistence Layer
//!
//! Postgres persistence for the inference cache and submitter history via SQLx.
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, cache
//! entries, submitter profiles, and history records live in PostgreSQL and
//! survive restarts. When absent, the service runs on in-memory backends
//! (suitable for development and testing).
//!
//! Each submodule is a set of free functions over `&PgPool`, one per query.

pub mod cache_entries;
pub mod history;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only mode. \
                 Cache and history will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Round-trip to the database, used by the readiness probe.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Map a stored fingerprint that fails validation to a decode error.
pub(crate) fn decode_fingerprint(raw: &str) -> Result<stemcache_core::Fingerprint, sqlx::Error> {
    stemcache_core::Fingerprint::parse(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
