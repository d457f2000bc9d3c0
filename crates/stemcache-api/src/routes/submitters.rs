//! # Submitter Profiles
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | PUT | `/api/submitters/me` | create the caller's profile |
//!
//! History is only recorded for submitters with a profile. Provisioning is
//! idempotent, so clients may call it on every sign-in.

use axum::extract::State;
use axum::routing::put;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// A provisioned submitter profile.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitterProfile {
    pub submitter_id: Uuid,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/submitters/me", put(provision))
}

#[utoipa::path(
    put,
    path = "/api/submitters/me",
    responses(
        (status = 200, description = "Profile exists for the caller", body = SubmitterProfile),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorBody),
        (status = 500, description = "Storage failure", body = crate::error::ErrorBody),
    ),
    tag = "submitters"
)]
async fn provision(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<SubmitterProfile>, AppError> {
    state.ledger.register_submitter(caller.submitter).await?;
    tracing::info!(submitter = %caller.submitter, "submitter profile provisioned");

    Ok(Json(SubmitterProfile {
        submitter_id: caller.submitter.0,
    }))
}
