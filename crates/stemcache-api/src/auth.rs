//! # Submitter Identity
//!
//! Resolves the submitter behind each request and injects a [`CallerIdentity`]
//! into the request extensions. Handlers extract it via `FromRequestParts`.
//!
//! ## Token Format
//!
//! ```text
//! Authorization: Bearer {submitter_uuid}:{secret}
//! ```
//!
//! The secret is compared in constant time against `AUTH_TOKEN`. When no
//! token is configured (development), the submitter is taken from the
//! `X-Submitter-Id` header instead. Profile existence is not checked here;
//! that is the history ledger's concern.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, HeaderName, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use stemcache_core::SubmitterId;
use subtle::ConstantTimeEq;

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// Header naming the submitter when bearer auth is disabled.
pub const SUBMITTER_HEADER: HeaderName = HeaderName::from_static("x-submitter-id");

/// Identity of the caller, available to route handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub submitter: SubmitterId,
}

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of secrets.
///
/// When lengths differ, a dummy comparison keeps the timing independent of
/// where the mismatch is.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token of the form `{submitter_uuid}:{secret}`.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let (submitter, secret) = provided
        .split_once(':')
        .ok_or_else(|| "invalid token format, expected {submitter_id}:{secret}".to_string())?;

    if !constant_time_token_eq(secret, expected_secret) {
        return Err("invalid bearer token".into());
    }

    let submitter = submitter
        .parse::<SubmitterId>()
        .map_err(|e| format!("invalid submitter id: {e}"))?;

    Ok(CallerIdentity { submitter })
}

/// Resolve the caller and inject [`CallerIdentity`], or answer 401.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let identity = match expected_token {
        Some(expected) => bearer_identity(&request, &expected),
        None => header_identity(&request),
    };

    match identity {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(msg) => {
            tracing::warn!(reason = %msg, "authentication failed");
            unauthorized_response(&msg)
        }
    }
}

fn bearer_identity(request: &Request, expected: &str) -> Result<CallerIdentity, String> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "missing authorization header".to_string())?;

    let provided = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| "authorization header must use Bearer scheme".to_string())?;

    parse_bearer_token(provided, expected)
}

fn header_identity(request: &Request) -> Result<CallerIdentity, String> {
    let raw = request
        .headers()
        .get(SUBMITTER_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| format!("missing {SUBMITTER_HEADER} header"))?;

    let submitter = raw
        .trim()
        .parse::<SubmitterId>()
        .map_err(|e| format!("invalid submitter id: {e}"))?;
    Ok(CallerIdentity { submitter })
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
