//! # stemcache-api — Axum Service for the Inference Cache
//!
//! Accepts media artifacts, serves previously computed results by content
//! fingerprint, delegates new content to the compute backend, and keeps a
//! paginated history of every submission per submitter.
//!
//! ## API Surface
//!
//! | Path | Module | Auth |
//! |------|--------|------|
//! | `POST /api/infer/segment` | [`routes::inference`] | yes |
//! | `GET /api/infer/results` | [`routes::inference`] | yes |
//! | `PUT /api/submitters/me` | [`routes::submitters`] | yes |
//! | `GET /openapi.json` | [`openapi`] | yes |
//! | `GET /health/liveness`, `GET /health/readiness` | this module | no |
//! | `GET /metrics` | [`middleware::metrics`] | no |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! ## Storage
//!
//! With a database pool the cache and ledger live in Postgres
//! ([`db`]); without one they are process-local maps.

pub mod artifact;
pub mod auth;
pub mod cache;
pub mod db;
pub mod error;
pub mod history;
pub mod middleware;
pub mod openapi;
pub mod orchestration;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::inference::router(state.config.max_upload_bytes))
        .merge(routes::submitters::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(middleware::metrics::render));

    Router::new()
        .merge(ops)
        .merge(api)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
///
/// Checks, each only when configured:
/// - Database connection is healthy.
/// - Compute backend answers its health endpoint.
///
/// Returns 200 "ready" or 503 with a diagnostic message.
async fn readiness(State(state): State<AppState>) -> Response {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = db::ping(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    // Without a backend, misses already fail with 500 while hits are served,
    // so the probe passes.
    if let Some(engine) = &state.engine {
        if let Err(e) = engine.health_check().await {
            tracing::warn!("Compute backend health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "compute backend unreachable")
                .into_response();
        }
    }

    "ready".into_response()
}
