//! # Prometheus Metrics
//!
//! Counters are recorded through the `metrics` facade. The binary installs a
//! `metrics-exporter-prometheus` recorder and `/metrics` renders it; without
//! a recorder (tests, embedding) every call is a no-op.
//!
//! | Counter | Labels |
//! |---------|--------|
//! | `stemcache_http_requests_total` | `method`, `status` |
//! | `stemcache_http_errors_total` | `method`, `status` |
//! | `stemcache_cache_hits_total` | |
//! | `stemcache_cache_misses_total` | |
//! | `stemcache_backend_failures_total` | |

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

pub const HTTP_REQUESTS: &str = "stemcache_http_requests_total";
pub const HTTP_ERRORS: &str = "stemcache_http_errors_total";
pub const CACHE_HITS: &str = "stemcache_cache_hits_total";
pub const CACHE_MISSES: &str = "stemcache_cache_misses_total";
pub const BACKEND_FAILURES: &str = "stemcache_backend_failures_total";

/// Install the process-wide Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    metrics::describe_counter!(HTTP_REQUESTS, "HTTP requests served");
    metrics::describe_counter!(HTTP_ERRORS, "HTTP requests answered with a 4xx or 5xx status");
    metrics::describe_counter!(CACHE_HITS, "Submissions served from the inference cache");
    metrics::describe_counter!(CACHE_MISSES, "Submissions delegated to the compute backend");
    metrics::describe_counter!(BACKEND_FAILURES, "Failed compute backend delegations");
    Ok(handle)
}

pub fn record_cache_hit() {
    metrics::counter!(CACHE_HITS).increment(1);
}

pub fn record_cache_miss() {
    metrics::counter!(CACHE_MISSES).increment(1);
}

pub fn record_backend_failure() {
    metrics::counter!(BACKEND_FAILURES).increment(1);
}

/// Middleware that counts requests and error responses.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();

    let response = next.run(request).await;

    let status = response.status();
    let labels = [("method", method), ("status", status.as_u16().to_string())];
    metrics::counter!(HTTP_REQUESTS, &labels).increment(1);
    if status.is_client_error() || status.is_server_error() {
        metrics::counter!(HTTP_ERRORS, &labels).increment(1);
    }

    response
}

/// `GET /metrics`: Prometheus text exposition.
pub async fn render(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use metrics_exporter_prometheus::PrometheusRecorder;
    use tower::ServiceExt;

    fn local_recorder() -> PrometheusRecorder {
        PrometheusBuilder::new().build_recorder()
    }

    #[test]
    fn counters_are_rendered() {
        let recorder = local_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            record_cache_hit();
            record_cache_hit();
            record_cache_miss();
            record_backend_failure();
        });

        let text = handle.render();
        assert!(text.contains("stemcache_cache_hits_total 2"), "{text}");
        assert!(text.contains("stemcache_cache_misses_total 1"), "{text}");
        assert!(text.contains("stemcache_backend_failures_total 1"), "{text}");
    }

    #[tokio::test]
    async fn middleware_passes_response_through() {
        let app = Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/boom", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .layer(from_fn(metrics_middleware));

        let ok = app
            .clone()
            .oneshot(axum::http::Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let boom = app
            .oneshot(axum::http::Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(boom.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
