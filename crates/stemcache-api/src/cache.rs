//! # Inference Cache
//!
//! Maps a content [`Fingerprint`] to the one stored result for that content.
//! Get-or-compute is composed by the orchestrator from [`InferenceCache::lookup`]
//! and [`InferenceCache::upsert`]; the cache itself never calls the backend.
//!
//! Both backends make `upsert` atomic: Postgres through a single
//! `ON CONFLICT DO UPDATE` statement, the in-memory map by holding the write
//! lock for the whole read-modify-write. No lock is held across an `.await`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use sqlx::PgPool;
use stemcache_core::{CacheEntry, Fingerprint, NamedPart};

use crate::db;
use crate::error::StoreError;

/// Fingerprint-keyed result store.
#[derive(Debug, Clone)]
pub struct InferenceCache {
    backend: Backend,
}

#[derive(Debug, Clone)]
enum Backend {
    InMemory(Arc<RwLock<HashMap<Fingerprint, CacheEntry>>>),
    Postgres(PgPool),
}

impl InferenceCache {
    /// Process-local cache, lost on restart.
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

    /// Fetch the entry for `fingerprint`. A miss is `Ok(None)`.
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, StoreError> {
        match &self.backend {
            Backend::InMemory(map) => Ok(map.read().get(fingerprint).cloned()),
            Backend::Postgres(pool) => Ok(db::cache_entries::find(pool, fingerprint).await?),
        }
    }

    /// Create or overwrite the entry for `fingerprint`.
    ///
    /// The last full write wins on every non-key field; `legacy_locations`
    /// is always rewritten from `parts`.
    pub async fn upsert(
        &self,
        fingerprint: Fingerprint,
        source_name: &str,
        parts: Vec<NamedPart>,
    ) -> Result<CacheEntry, StoreError> {
        let now = Utc::now();
        match &self.backend {
            Backend::InMemory(map) => {
                let mut map = map.write();
                let stored = match map.entry(fingerprint) {
                    Entry::Occupied(mut slot) => {
                        slot.get_mut().overwrite(source_name.to_string(), parts, now);
                        slot.get().clone()
                    }
                    Entry::Vacant(slot) => {
                        let key = slot.key().clone();
                        slot.insert(CacheEntry::new(key, source_name, parts, now)).clone()
                    }
                };
                Ok(stored)
            }
            Backend::Postgres(pool) => {
                let entry = CacheEntry::new(fingerprint, source_name, parts, now);
                Ok(db::cache_entries::upsert(pool, &entry).await?)
            }
        }
    }

    /// Write an entry exactly as given, e.g. one imported from an older
    /// deployment that only recorded `legacy_locations`.
    pub async fn restore(&self, entry: CacheEntry) -> Result<CacheEntry, StoreError> {
        match &self.backend {
            Backend::InMemory(map) => {
                map.write().insert(entry.fingerprint.clone(), entry.clone());
                Ok(entry)
            }
            Backend::Postgres(pool) => Ok(db::cache_entries::upsert(pool, &entry).await?),
        }
    }
}
