//! Connect-failure retry with exponential backoff.
//!
//! Only requests that never reached the engine are re-sent. Timeouts and
//! error responses are returned immediately: the engine may already be
//! working on the artifact.

use std::time::Duration;

use crate::error::EngineError;

/// Base delay between retries (doubles each attempt: 200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// Run `f` once, then up to `max_retries` more times while it fails to connect.
pub(crate) async fn retry_send<F, Fut>(
    max_retries: u32,
    f: F,
) -> Result<reqwest::Response, EngineError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, EngineError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Err(e) if e.is_connect_failure() && attempt < max_retries => {
                let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt));
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries,
                    "compute backend connection failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}
