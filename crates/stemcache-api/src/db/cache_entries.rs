//! Cache entry persistence: one row per fingerprint.
//!
//! Writes are single `INSERT ... ON CONFLICT (fingerprint) DO UPDATE`
//! statements, so concurrent writers for the same fingerprint converge on
//! one row and the last full write wins.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use stemcache_core::{CacheEntry, Fingerprint, NamedPart};

/// Database row for a cache entry.
#[derive(Debug, sqlx::FromRow)]
pub struct CacheEntryRow {
    pub fingerprint: String,
    pub source_name: String,
    pub parts: Json<Vec<NamedPart>>,
    pub legacy_locations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CacheEntryRow {
    pub fn into_entry(self) -> Result<CacheEntry, sqlx::Error> {
        Ok(CacheEntry {
            fingerprint: super::decode_fingerprint(&self.fingerprint)?,
            source_name: self.source_name,
            parts: self.parts.0,
            legacy_locations: self.legacy_locations,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const COLUMNS: &str = "fingerprint, source_name, parts, legacy_locations, created_at, updated_at";

/// Fetch the entry for a fingerprint.
pub async fn find(pool: &PgPool, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, sqlx::Error> {
    let row = sqlx::query_as::<_, CacheEntryRow>(&format!(
        "SELECT {COLUMNS} FROM cache_entries WHERE fingerprint = $1"
    ))
    .bind(fingerprint.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(CacheEntryRow::into_entry).transpose()
}

/// Insert or overwrite the entry for `entry.fingerprint`.
///
/// `created_at` of an existing row is kept; every other column is replaced.
pub async fn upsert(pool: &PgPool, entry: &CacheEntry) -> Result<CacheEntry, sqlx::Error> {
    let row = sqlx::query_as::<_, CacheEntryRow>(&format!(
        "INSERT INTO cache_entries ({COLUMNS})
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (fingerprint) DO UPDATE SET
             source_name = EXCLUDED.source_name,
             parts = EXCLUDED.parts,
             legacy_locations = EXCLUDED.legacy_locations,
             updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(entry.fingerprint.as_str())
    .bind(&entry.source_name)
    .bind(Json(&entry.parts))
    .bind(&entry.legacy_locations)
    .bind(entry.created_at)
    .bind(entry.updated_at)
    .fetch_one(pool)
    .await?;

    row.into_entry()
}
