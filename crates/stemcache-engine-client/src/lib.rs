//! # stemcache-engine-client -- Typed client for the compute backend
//!
//! The compute backend is an opaque inference engine reached over HTTP. This
//! crate is the only path the service uses to talk to it.
//!
//! ## Wire Contract
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | POST | `{base}/infer` | multipart: `file` (artifact), `cache_id` (fingerprint) | [`InferResponse`] |
//! | GET  | `{base}/health` | — | any 2xx |
//!
//! The artifact is streamed from disk, never buffered whole in memory.

pub mod config;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use config::EngineConfig;
pub use error::EngineError;
pub use types::{EngineOutcome, InferResponse, WireStem};

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use stemcache_core::Fingerprint;
use url::Url;

/// Upper bound on a health check, independent of the inference timeout.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the compute backend.
#[derive(Debug, Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    base_url: Url,
    max_retries: u32,
}

impl EngineClient {
    /// Create a new client from configuration.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.api_token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| config::ConfigError::InvalidToken)?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| EngineError::Unavailable {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
            max_retries: config.max_retries,
        })
    }

    fn url(&self, path: &str) -> Result<Url, EngineError> {
        self.base_url.join(path).map_err(|e| {
            EngineError::Config(config::ConfigError::InvalidUrl(
                path.to_string(),
                e.to_string(),
            ))
        })
    }

    /// Delegate one artifact to the engine.
    ///
    /// Calls `POST {base_url}/infer` with the artifact as the `file` part
    /// (filename `source_name`) and `fingerprint` as `cache_id`. The artifact
    /// is reopened for every attempt so a re-send streams it from the start.
    pub async fn process(
        &self,
        artifact: &Path,
        source_name: &str,
        fingerprint: &Fingerprint,
    ) -> Result<EngineOutcome, EngineError> {
        let endpoint = "POST /infer";
        let url = self.url("infer")?;

        let resp = retry::retry_send(self.max_retries, move || {
            let http = self.http.clone();
            let url = url.clone();
            async move {
                let form = artifact_form(artifact, source_name, fingerprint).await?;
                http.post(url)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| EngineError::Unavailable {
                        endpoint: endpoint.into(),
                        source: e,
                    })
            }
        })
        .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::Rejected {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        let body: InferResponse = resp.json().await.map_err(|e| EngineError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })?;

        Ok(body.into())
    }

    /// Check that the engine is reachable and healthy.
    ///
    /// Calls `GET {base_url}/health`; any 2xx counts as healthy. Gives up
    /// after [`HEALTH_CHECK_TIMEOUT`].
    pub async fn health_check(&self) -> Result<(), EngineError> {
        let endpoint = "GET /health";
        let resp = self
            .http
            .get(self.url("health")?)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
            .map_err(|e| EngineError::Unavailable {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(EngineError::Rejected {
                endpoint: endpoint.into(),
                status,
                body,
            })
        }
    }
}

async fn artifact_form(
    artifact: &Path,
    source_name: &str,
    fingerprint: &Fingerprint,
) -> Result<Form, EngineError> {
    let io_err = |source: std::io::Error| EngineError::Io {
        path: artifact.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(artifact).await.map_err(io_err)?;
    let len = file.metadata().await.map_err(io_err)?.len();

    let part = Part::stream_with_length(file, len).file_name(source_name.to_string());

    Ok(Form::new()
        .part("file", part)
        .text("cache_id", fingerprint.to_string()))
}
