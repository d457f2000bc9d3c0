//! # stemcache-api — Binary Entry Point
//!
//! Reads configuration from the environment, connects the optional database
//! and compute backend, and serves the API (default port 8080).

use stemcache_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::from_env();
    tracing::info!(?config, "configuration loaded");

    // Absent DATABASE_URL means in-memory only.
    let db_pool = stemcache_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let engine = match stemcache_engine_client::EngineConfig::from_env() {
        Ok(engine_config) => {
            tracing::info!(base_url = %engine_config.base_url, "compute backend configured");
            match stemcache_engine_client::EngineClient::new(engine_config) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::error!("Failed to create compute backend client: {e}");
                    return Err(e.into());
                }
            }
        }
        Err(e) => {
            tracing::warn!("Compute backend not configured: {e}. Cache misses will fail.");
            None
        }
    };

    let mut state = AppState::new(config.clone(), engine, db_pool);
    match stemcache_api::middleware::metrics::install_recorder() {
        Ok(handle) => state = state.with_prometheus(handle),
        Err(e) => tracing::warn!("Prometheus recorder not installed: {e}"),
    }

    let app = stemcache_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("stemcache API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Text logs by default, JSON when `LOG_FORMAT=json`. `RUST_LOG` overrides
/// the `info` default filter.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
