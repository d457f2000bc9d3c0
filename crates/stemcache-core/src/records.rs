//! # Stored Records
//!
//! [`CacheEntry`] is the single stored result for a fingerprint.
//! [`HistoryRecord`] is one submission event pointing at a cache entry.
//!
//! Both carry the named `parts` and a flattened list of locations. Older
//! records may hold only the flattened list; `resolved_parts()` applies
//! [`normalize`] so such records are served in the current shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fingerprint::Fingerprint;
use crate::identity::SubmitterId;
use crate::parts::{locations, normalize, NamedPart, RawResult};

/// The unique stored result for a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub source_name: String,
    pub parts: Vec<NamedPart>,
    /// Flattened `parts` locations, kept in sync on every write.
    pub legacy_locations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Build a fresh entry, deriving `legacy_locations` from `parts`.
    pub fn new(
        fingerprint: Fingerprint,
        source_name: impl Into<String>,
        parts: Vec<NamedPart>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            fingerprint,
            source_name: source_name.into(),
            legacy_locations: locations(&parts),
            parts,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the non-key fields (last write wins), keeping `created_at`.
    pub fn overwrite(&mut self, source_name: String, parts: Vec<NamedPart>, now: DateTime<Utc>) {
        self.source_name = source_name;
        self.legacy_locations = locations(&parts);
        self.parts = parts;
        self.updated_at = now;
    }

    /// Parts in canonical form, synthesized from `legacy_locations` when empty.
    pub fn resolved_parts(&self) -> Vec<NamedPart> {
        normalize(RawResult {
            named: Some(self.parts.clone()),
            positional: self.legacy_locations.clone(),
        })
    }
}

/// One submission event in a submitter's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    pub submitter: SubmitterId,
    pub source_name: String,
    pub fingerprint: Fingerprint,
    pub locations: Vec<String>,
    pub parts: Vec<NamedPart>,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Build a record for a submission happening at `created_at`.
    pub fn new(
        submitter: SubmitterId,
        source_name: impl Into<String>,
        fingerprint: Fingerprint,
        parts: Vec<NamedPart>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            submitter,
            source_name: source_name.into(),
            fingerprint,
            locations: locations(&parts),
            parts,
            created_at,
        }
    }

    /// Parts in canonical form, synthesized from `locations` when empty.
    pub fn resolved_parts(&self) -> Vec<NamedPart> {
        normalize(RawResult {
            named: Some(self.parts.clone()),
            positional: self.locations.clone(),
        })
    }
}
