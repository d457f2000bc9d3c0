//! # API Error Types
//!
//! Two response shapes leave this service:
//!
//! - [`AppError`] renders `{ "error": { "code", "message" } }` and is used by
//!   the history listing and the auth layer.
//! - [`SubmissionError`] renders `{ "status": "error", "message" }`, the shape
//!   submission clients already parse.
//!
//! Storage failures are logged with full detail and reported to clients with
//! a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use stemcache_core::FingerprintError;
use stemcache_engine_client::EngineError;
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "UNAUTHORIZED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Body of a failed submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionErrorBody {
    /// Always `"error"`.
    pub status: String,
    pub message: String,
}

// ── Store errors ────────────────────────────────────────────────────────────

/// Failure of the persistent record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failure of a history ledger operation.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// No profile exists for the submitter.
    #[error("submitter {0} not found")]
    SubmitterNotFound(stemcache_core::SubmitterId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for HistoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::Database(err))
    }
}

// ── AppError ────────────────────────────────────────────────────────────────

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or invalid identity (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::NotFound(msg) | Self::Unauthorized(msg) => msg.clone(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::SubmitterNotFound(_) => Self::NotFound("submitter not found".into()),
            HistoryError::Store(e) => Self::Internal(e.to_string()),
        }
    }
}

// ── SubmissionError ─────────────────────────────────────────────────────────

/// Failure of a submission, rendered as `{ "status": "error", "message" }`.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// The request carried no `file` field (400).
    #[error("no file uploaded")]
    MissingArtifact,

    /// The multipart body could not be read (400).
    #[error("upload failed: {0}")]
    Upload(String),

    /// The upload could not be written to the upload directory (500).
    #[error("failed to spool upload: {0}")]
    Spool(#[source] std::io::Error),

    /// The spooled artifact could not be hashed (500).
    #[error("fingerprint computation failed: {0}")]
    Fingerprint(#[from] FingerprintError),

    /// The compute backend failed or is not configured (500).
    #[error(transparent)]
    Backend(#[from] BackendFailure),

    /// The cache or history store failed (500).
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Why the compute backend could not produce a result.
#[derive(Error, Debug)]
pub enum BackendFailure {
    #[error("compute backend is not configured")]
    NotConfigured,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<EngineError> for SubmissionError {
    fn from(err: EngineError) -> Self {
        Self::Backend(BackendFailure::Engine(err))
    }
}

impl SubmissionError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingArtifact | Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::Spool(_) | Self::Fingerprint(_) | Self::Backend(_) | Self::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. The backend's raw payload is passed through;
    /// local disk and storage details are not.
    fn client_message(&self) -> String {
        match self {
            Self::Backend(BackendFailure::Engine(e)) => e
                .raw_payload()
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string()),
            Self::Spool(_) => "upload could not be stored".to_string(),
            Self::Storage(_) => "storage unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for SubmissionError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "submission failed");
        }

        let body = SubmissionErrorBody {
            status: "error".to_string(),
            message: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}
