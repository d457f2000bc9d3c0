//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI 3.1 document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "stemcache API",
        version = "0.1.0",
        description = "Content-addressed inference cache with per-submitter processing history.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::inference::segment,
        crate::routes::inference::results,
        crate::routes::submitters::provision,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::error::SubmissionErrorBody,
        crate::routes::inference::StemView,
        crate::routes::inference::SegmentUpload,
        crate::routes::inference::SubmissionResponse,
        crate::routes::inference::HistoryItem,
        crate::routes::inference::HistoryResponse,
        crate::routes::submitters::SubmitterProfile,
    )),
    tags(
        (name = "inference", description = "Artifact submission and submission history"),
        (name = "submitters", description = "Submitter profile provisioning"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
