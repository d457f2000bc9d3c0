//! # Inference Orchestration
//!
//! Composes fingerprinting, the cache, the compute backend, and the history
//! ledger into one submission:
//!
//! ```text
//! Received → FingerprintComputed → CacheHit ─────────────────────────────┐
//!                                → CacheMiss → BackendInvoked → CacheWritten
//!                                                                        ↓
//!                                              HistoryAppended → Responded
//! ```
//!
//! Any stage may end in `Failed`. The lookup always precedes the backend
//! call, and the history append always follows the cache read or write.
//! The orchestrator never retries the backend.
//!
//! Concurrent misses for the same content may both reach the backend; the
//! cache upsert converges them on one entry.

use stemcache_core::{normalize, Fingerprint, FingerprintComputer, FingerprintError, NamedPart, SubmitterId};
use stemcache_engine_client::EngineClient;

use crate::artifact::TransientArtifact;
use crate::cache::InferenceCache;
use crate::error::{BackendFailure, HistoryError, SubmissionError};
use crate::history::HistoryLedger;
use crate::middleware::metrics::{
    record_backend_failure, record_cache_hit, record_cache_miss,
};

/// Status reported for a result served from the cache.
pub const STATUS_CACHED: &str = "cached";

/// Status reported for a fresh result when the backend gives none.
pub const STATUS_SUCCESS: &str = "success";

/// Submission lifecycle stages, emitted as the `stage` field of trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    FingerprintComputed,
    CacheHit,
    CacheMiss,
    BackendInvoked,
    CacheWritten,
    HistoryAppended,
    Responded,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::FingerprintComputed => "fingerprint_computed",
            Self::CacheHit => "cache_hit",
            Self::CacheMiss => "cache_miss",
            Self::BackendInvoked => "backend_invoked",
            Self::CacheWritten => "cache_written",
            Self::HistoryAppended => "history_appended",
            Self::Responded => "responded",
            Self::Failed => "failed",
        }
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// `"cached"` on a hit, the backend's status (default `"success"`) on a miss.
    pub status: String,
    /// Key of the cache entry the result is stored under.
    pub cache_id: Fingerprint,
    pub parts: Vec<NamedPart>,
}

/// Drives one submission from uploaded artifact to response.
#[derive(Debug, Clone)]
pub struct InferenceOrchestrator {
    cache: InferenceCache,
    ledger: HistoryLedger,
    engine: Option<EngineClient>,
}

impl InferenceOrchestrator {
    /// `engine` is `None` when no backend is configured; misses then fail.
    pub fn new(cache: InferenceCache, ledger: HistoryLedger, engine: Option<EngineClient>) -> Self {
        Self {
            cache,
            ledger,
            engine,
        }
    }

    /// Serve `artifact` for `submitter`, from the cache when possible.
    pub async fn submit(
        &self,
        submitter: SubmitterId,
        artifact: &TransientArtifact,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        tracing::info!(
            stage = Stage::Received.as_str(),
            submitter = %submitter,
            source_name = artifact.source_name(),
            "submission received"
        );

        let result = self.run(submitter, artifact).await;
        match &result {
            Ok(outcome) => tracing::info!(
                stage = Stage::Responded.as_str(),
                fingerprint = %outcome.cache_id,
                submitter = %submitter,
                status = %outcome.status,
                parts = outcome.parts.len(),
                "submission complete"
            ),
            Err(e) => tracing::warn!(
                stage = Stage::Failed.as_str(),
                submitter = %submitter,
                "submission failed: {e}"
            ),
        }
        result
    }

    async fn run(
        &self,
        submitter: SubmitterId,
        artifact: &TransientArtifact,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let fingerprint = fingerprint_file(artifact).await?;
        trace_stage(Stage::FingerprintComputed, &fingerprint, submitter);

        let outcome = match self.cache.lookup(&fingerprint).await? {
            Some(entry) => {
                record_cache_hit();
                trace_stage(Stage::CacheHit, &fingerprint, submitter);
                SubmissionOutcome {
                    status: STATUS_CACHED.to_string(),
                    cache_id: entry.fingerprint.clone(),
                    parts: entry.resolved_parts(),
                }
            }
            None => {
                record_cache_miss();
                trace_stage(Stage::CacheMiss, &fingerprint, submitter);
                self.compute(submitter, artifact, fingerprint).await?
            }
        };

        match self
            .ledger
            .append(
                submitter,
                artifact.source_name(),
                outcome.cache_id.clone(),
                outcome.parts.clone(),
            )
            .await
        {
            Ok(_) => trace_stage(Stage::HistoryAppended, &outcome.cache_id, submitter),
            // History is best-effort when the profile is missing; the result
            // is already cached and is still returned.
            Err(HistoryError::SubmitterNotFound(_)) => tracing::warn!(
                fingerprint = %outcome.cache_id,
                submitter = %submitter,
                "submitter profile not found, history not recorded"
            ),
            Err(HistoryError::Store(e)) => return Err(e.into()),
        }

        Ok(outcome)
    }

    /// Cache-miss path: delegate to the backend and store its result.
    async fn compute(
        &self,
        submitter: SubmitterId,
        artifact: &TransientArtifact,
        fingerprint: Fingerprint,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let Some(engine) = &self.engine else {
            record_backend_failure();
            return Err(BackendFailure::NotConfigured.into());
        };

        trace_stage(Stage::BackendInvoked, &fingerprint, submitter);
        let response = engine
            .process(artifact.path(), artifact.source_name(), &fingerprint)
            .await
            .map_err(|e| {
                record_backend_failure();
                SubmissionError::from(e)
            })?;

        let cache_id = match response.cache_id.as_deref().map(Fingerprint::parse) {
            Some(Ok(id)) => id,
            Some(Err(e)) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    "ignoring unusable cache_id from compute backend: {e}"
                );
                fingerprint
            }
            None => fingerprint,
        };

        let parts = normalize(response.raw);
        let entry = self
            .cache
            .upsert(cache_id, artifact.source_name(), parts)
            .await?;
        trace_stage(Stage::CacheWritten, &entry.fingerprint, submitter);

        Ok(SubmissionOutcome {
            status: response
                .status
                .unwrap_or_else(|| STATUS_SUCCESS.to_string()),
            cache_id: entry.fingerprint,
            parts: entry.parts,
        })
    }
}

/// Hash the artifact on the blocking pool.
async fn fingerprint_file(artifact: &TransientArtifact) -> Result<Fingerprint, FingerprintError> {
    let path = artifact.path().to_path_buf();
    tokio::task::spawn_blocking(move || FingerprintComputer::compute_file(&path))
        .await
        .map_err(|e| FingerprintError::Io(std::io::Error::other(e)))?
}

fn trace_stage(stage: Stage, fingerprint: &Fingerprint, submitter: SubmitterId) {
    tracing::debug!(
        stage = stage.as_str(),
        fingerprint = %fingerprint,
        submitter = %submitter,
        "submission stage"
    );
}
