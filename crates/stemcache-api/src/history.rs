//! # History Ledger
//!
//! Append-only, per-submitter record of submissions. Each record points at a
//! cache entry by fingerprint and carries a snapshot of its parts; artifact
//! data is never duplicated here.
//!
//! Profiles are created by [`HistoryLedger::register_submitter`], reached
//! through `PUT /api/submitters/me`. Appending for a submitter without one
//! returns [`HistoryError::SubmitterNotFound`] and writes nothing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use sqlx::PgPool;
use stemcache_core::{paginate, Fingerprint, HistoryPage, HistoryRecord, NamedPart, PageRequest, SubmitterId};

use crate::db;
use crate::error::HistoryError;

/// Per-submitter submission history.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    backend: Backend,
}

#[derive(Debug, Clone)]
enum Backend {
    /// Records per submitter, in append order.
    InMemory(Arc<RwLock<HashMap<SubmitterId, Vec<HistoryRecord>>>>),
    Postgres(PgPool),
}

impl HistoryLedger {
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::InMemory(Arc::new(RwLock::new(HashMap::new()))),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            backend: Backend::Postgres(pool),
        }
    }

    /// Create a profile for `submitter`. Idempotent.
    pub async fn register_submitter(&self, submitter: SubmitterId) -> Result<(), HistoryError> {
        match &self.backend {
            Backend::InMemory(map) => {
                map.write().entry(submitter).or_default();
                Ok(())
            }
            Backend::Postgres(pool) => Ok(db::history::register_submitter(pool, submitter).await?),
        }
    }

    /// Record one submission event, timestamped now.
    pub async fn append(
        &self,
        submitter: SubmitterId,
        source_name: &str,
        fingerprint: Fingerprint,
        parts: Vec<NamedPart>,
    ) -> Result<HistoryRecord, HistoryError> {
        let record = HistoryRecord::new(submitter, source_name, fingerprint, parts, Utc::now());
        self.append_record(record).await
    }

    /// Record a fully built event, e.g. one imported from an older deployment.
    pub async fn append_record(&self, record: HistoryRecord) -> Result<HistoryRecord, HistoryError> {
        let inserted = match &self.backend {
            Backend::InMemory(map) => match map.write().get_mut(&record.submitter) {
                Some(records) => {
                    records.push(record.clone());
                    true
                }
                None => false,
            },
            Backend::Postgres(pool) => db::history::insert_if_submitter_exists(pool, &record).await?,
        };

        if inserted {
            Ok(record)
        } else {
            Err(HistoryError::SubmitterNotFound(record.submitter))
        }
    }

    /// One page of `submitter`'s history, newest first.
    ///
    /// `total` counts every record regardless of the page requested.
    pub async fn list(
        &self,
        submitter: SubmitterId,
        request: PageRequest,
    ) -> Result<HistoryPage, HistoryError> {
        match &self.backend {
            Backend::InMemory(map) => map
                .read()
                .get(&submitter)
                .map(|records| paginate(records, request))
                .ok_or(HistoryError::SubmitterNotFound(submitter)),
            Backend::Postgres(pool) => {
                let (total, items) = db::history::list_for_submitter(pool, submitter, request)
                    .await?
                    .ok_or(HistoryError::SubmitterNotFound(submitter))?;
                Ok(HistoryPage {
                    total: u64::try_from(total).unwrap_or_default(),
                    items,
                })
            }
        }
    }
}
