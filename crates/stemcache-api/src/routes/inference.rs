//! # Inference API
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/api/infer/segment` | submit an artifact, get its parts |
//! | GET  | `/api/infer/results` | paginated submission history |
//!
//! Both routes act on behalf of the [`CallerIdentity`] resolved by the auth
//! middleware.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stemcache_core::{format_timestamp, locations, HistoryRecord, NamedPart, PageRequest};
use utoipa::{IntoParams, ToSchema};

use crate::artifact::TransientArtifact;
use crate::auth::CallerIdentity;
use crate::error::{AppError, SubmissionError};
use crate::orchestration::SubmissionOutcome;
use crate::state::AppState;

/// A named result part as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StemView {
    pub name: String,
    pub url: String,
}

impl From<NamedPart> for StemView {
    fn from(part: NamedPart) -> Self {
        Self {
            name: part.name,
            url: part.location,
        }
    }
}

/// Multipart body of a submission.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct SegmentUpload {
    /// The artifact. Its filename is recorded as the source name.
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// Successful submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    /// `"cached"` when served from the cache, otherwise the backend's status.
    pub status: String,
    pub cache_id: String,
    /// Locations of every part, in order.
    pub outputs: Vec<String>,
    pub stems: Vec<StemView>,
}

impl From<SubmissionOutcome> for SubmissionResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        Self {
            status: outcome.status,
            cache_id: outcome.cache_id.into_inner(),
            outputs: locations(&outcome.parts),
            stems: outcome.parts.into_iter().map(StemView::from).collect(),
        }
    }
}

/// Raw pagination parameters. Malformed values fall back to defaults.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// 1-indexed page (default 1).
    pub page: Option<String>,
    /// Page size (default 10). Larger values are capped at 100; the applied
    /// size is echoed as `limit` in the response.
    pub limit: Option<String>,
}

/// One history entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub input_name: String,
    pub cache_id: String,
    /// RFC 3339, UTC, seconds precision.
    pub created_at: String,
    pub output_urls: Vec<String>,
    pub stems: Vec<StemView>,
}

impl From<HistoryRecord> for HistoryItem {
    fn from(record: HistoryRecord) -> Self {
        let parts = record.resolved_parts();
        Self {
            input_name: record.source_name,
            cache_id: record.fingerprint.into_inner(),
            created_at: format_timestamp(&record.created_at),
            output_urls: locations(&parts),
            stems: parts.into_iter().map(StemView::from).collect(),
        }
    }
}

/// A page of history. `page` and `limit` echo the values actually applied.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub total: u64,
    pub page: u32,
    /// Page size applied, at most 100.
    pub limit: u32,
    pub results: Vec<HistoryItem>,
}

/// Build the inference router. Submissions may carry up to `max_upload_bytes`.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/infer/segment",
            post(segment).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/infer/results", get(results))
}

#[utoipa::path(
    post,
    path = "/api/infer/segment",
    request_body(content = SegmentUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Parts for the artifact", body = SubmissionResponse),
        (status = 400, description = "No artifact or malformed upload", body = crate::error::SubmissionErrorBody),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorBody),
        (status = 500, description = "Backend or local storage failure", body = crate::error::SubmissionErrorBody),
    ),
    tag = "inference"
)]
async fn segment(
    State(state): State<AppState>,
    caller: CallerIdentity,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmissionResponse>, SubmissionError> {
    let mut multipart = multipart.map_err(|e| SubmissionError::Upload(e.body_text()))?;
    let artifact = TransientArtifact::receive(&mut multipart, &state.config.upload_dir).await?;

    let outcome = state.orchestrator.submit(caller.submitter, &artifact).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/api/infer/results",
    params(HistoryQuery),
    responses(
        (status = 200, description = "History page, newest first", body = HistoryResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorBody),
        (status = 404, description = "Submitter not found", body = crate::error::ErrorBody),
    ),
    tag = "inference"
)]
async fn results(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let request = PageRequest::from_query(query.page.as_deref(), query.limit.as_deref());
    let page = state.ledger.list(caller.submitter, request).await?;

    Ok(Json(HistoryResponse {
        total: page.total,
        page: request.page(),
        limit: request.limit(),
        results: page.items.into_iter().map(HistoryItem::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use stemcache_core::{FingerprintComputer, SubmitterId};

    #[test]
    fn submission_response_shape() {
        let outcome = SubmissionOutcome {
            status: "cached".into(),
            cache_id: FingerprintComputer::compute_bytes(b"abc"),
            parts: vec![NamedPart::new("Vocals", "v"), NamedPart::new("Drums", "d")],
        };
        let json = serde_json::to_value(SubmissionResponse::from(outcome)).unwrap();
        assert_eq!(json["status"], "cached");
        assert_eq!(
            json["cacheId"],
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(json["outputs"], serde_json::json!(["v", "d"]));
        assert_eq!(json["stems"][0], serde_json::json!({"name": "Vocals", "url": "v"}));
    }

    #[test]
    fn legacy_history_item_gets_positional_stems() {
        let created = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let mut record = HistoryRecord::new(
            SubmitterId::new(),
            "old.mp3",
            FingerprintComputer::compute_bytes(b"old"),
            vec![],
            created,
        );
        record.locations = vec!["a".into(), "b".into()];

        let json = serde_json::to_value(HistoryItem::from(record)).unwrap();
        assert_eq!(json["inputName"], "old.mp3");
        assert_eq!(json["createdAt"], "2026-01-15T12:00:00Z");
        assert_eq!(json["outputUrls"], serde_json::json!(["a", "b"]));
        assert_eq!(json["stems"][1], serde_json::json!({"name": "Stem 2", "url": "b"}));
    }
}
