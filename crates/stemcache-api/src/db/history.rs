//! Submitter profiles and history records.
//!
//! History rows reference the submitter by foreign key and the cache entry
//! by fingerprint only.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use stemcache_core::{HistoryRecord, NamedPart, PageRequest, SubmitterId};
use uuid::Uuid;

/// Database row for a history record.
#[derive(Debug, sqlx::FromRow)]
pub struct HistoryRow {
    pub id: Uuid,
    pub submitter_id: Uuid,
    pub source_name: String,
    pub fingerprint: String,
    pub locations: Vec<String>,
    pub parts: Json<Vec<NamedPart>>,
    pub created_at: DateTime<Utc>,
}

impl HistoryRow {
    pub fn into_record(self) -> Result<HistoryRecord, sqlx::Error> {
        Ok(HistoryRecord {
            id: self.id,
            submitter: SubmitterId(self.submitter_id),
            source_name: self.source_name,
            fingerprint: super::decode_fingerprint(&self.fingerprint)?,
            locations: self.locations,
            parts: self.parts.0,
            created_at: self.created_at,
        })
    }
}

/// Create a submitter profile if it does not exist yet.
pub async fn register_submitter(pool: &PgPool, submitter: SubmitterId) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO submitters (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(submitter.0)
        .execute(pool)
        .await?;
    Ok(())
}

async fn submitter_exists(conn: &mut PgConnection, submitter: SubmitterId) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM submitters WHERE id = $1)")
        .bind(submitter.0)
        .fetch_one(conn)
        .await
}

/// Insert a record if its submitter exists, in one statement.
///
/// Returns `false` when no profile exists and nothing was written.
pub async fn insert_if_submitter_exists(
    pool: &PgPool,
    record: &HistoryRecord,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO history_records
             (id, submitter_id, source_name, fingerprint, locations, parts, created_at)
         SELECT $1::uuid, $2::uuid, $3::text, $4::text, $5::text[], $6::jsonb, $7::timestamptz
         WHERE EXISTS (SELECT 1 FROM submitters WHERE id = $2::uuid)",
    )
    .bind(record.id)
    .bind(record.submitter.0)
    .bind(&record.source_name)
    .bind(record.fingerprint.as_str())
    .bind(&record.locations)
    .bind(Json(&record.parts))
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// The total record count and one page of a submitter's records, newest
/// first, read from one snapshot.
///
/// Returns `None` when the submitter has no profile.
pub async fn list_for_submitter(
    pool: &PgPool,
    submitter: SubmitterId,
    request: PageRequest,
) -> Result<Option<(i64, Vec<HistoryRecord>)>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;

    if !submitter_exists(&mut tx, submitter).await? {
        tx.commit().await?;
        return Ok(None);
    }
    let total = count_for_submitter(&mut tx, submitter).await?;
    let items = page_for_submitter(&mut tx, submitter, request).await?;

    tx.commit().await?;
    Ok(Some((total, items)))
}

async fn count_for_submitter(conn: &mut PgConnection, submitter: SubmitterId) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM history_records WHERE submitter_id = $1")
        .bind(submitter.0)
        .fetch_one(conn)
        .await
}

async fn page_for_submitter(
    conn: &mut PgConnection,
    submitter: SubmitterId,
    request: PageRequest,
) -> Result<Vec<HistoryRecord>, sqlx::Error> {
    let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
    let rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT id, submitter_id, source_name, fingerprint, locations, parts, created_at
         FROM history_records
         WHERE submitter_id = $1
         ORDER BY created_at DESC, seq DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(submitter.0)
    .bind(i64::from(request.limit()))
    .bind(offset)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(HistoryRow::into_record).collect()
}
