//! # Application State
//!
//! Configuration read once at startup and the shared handles every request
//! uses. Everything in [`AppState`] is a cheap clone of a shared handle.

use std::path::PathBuf;

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use stemcache_engine_client::EngineClient;

use crate::cache::InferenceCache;
use crate::history::HistoryLedger;
use crate::orchestration::InferenceOrchestrator;

/// Default request body limit for submissions (256 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Service configuration.
///
/// Custom `Debug` redacts the auth token.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Shared bearer secret. `None` disables bearer auth.
    pub auth_token: Option<String>,
    /// Directory transient uploads are written to.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("upload_dir", &self.upload_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            upload_dir: std::env::temp_dir(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 8080)
    /// - `AUTH_TOKEN` (optional; unset disables bearer auth)
    /// - `UPLOAD_DIR` (default: system temp dir)
    /// - `MAX_UPLOAD_BYTES` (default: 268435456)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_number("PORT").unwrap_or(defaults.port),
            auth_token: std::env::var("AUTH_TOKEN").ok().filter(|t| !t.is_empty()),
            upload_dir: std::env::var_os("UPLOAD_DIR")
                .filter(|d| !d.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: env_number("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
        }
    }
}

fn env_number<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub cache: InferenceCache,
    pub ledger: HistoryLedger,
    pub orchestrator: InferenceOrchestrator,
    /// Compute backend, probed by the readiness check.
    pub engine: Option<EngineClient>,
    pub db_pool: Option<PgPool>,
    /// Set when the Prometheus recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state on Postgres when a pool is given, in memory otherwise.
    pub fn new(config: AppConfig, engine: Option<EngineClient>, db_pool: Option<PgPool>) -> Self {
        let (cache, ledger) = match &db_pool {
            Some(pool) => (
                InferenceCache::postgres(pool.clone()),
                HistoryLedger::postgres(pool.clone()),
            ),
            None => (InferenceCache::in_memory(), HistoryLedger::in_memory()),
        };
        let orchestrator = InferenceOrchestrator::new(cache.clone(), ledger.clone(), engine.clone());

        Self {
            config,
            cache,
            ledger,
            orchestrator,
            engine,
            db_pool,
            prometheus: None,
        }
    }

    /// In-memory state, for development and tests.
    pub fn in_memory(config: AppConfig, engine: Option<EngineClient>) -> Self {
        Self::new(config, engine, None)
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
