//! Compute backend client configuration.
//!
//! Read once at process start and passed to [`crate::EngineClient::new`].

use url::Url;

/// Configuration for connecting to the compute backend.
///
/// Custom `Debug` implementation redacts the `api_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct EngineConfig {
    /// Base URL of the engine. `infer` and `health` are resolved against it.
    pub base_url: Url,
    /// Optional bearer token sent on every request.
    pub api_token: Option<String>,
    /// Request timeout in seconds. Inference on long tracks is slow.
    pub timeout_secs: u64,
    /// Re-sends allowed when the connection could not be established.
    pub max_retries: u32,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ENGINE_URL` (required)
    /// - `ENGINE_API_TOKEN` (optional)
    /// - `ENGINE_TIMEOUT_SECS` (default: 600)
    /// - `ENGINE_MAX_RETRIES` (default: 2)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("ENGINE_URL").map_err(|_| ConfigError::MissingUrl)?;
        Ok(Self {
            base_url: parse_base_url("ENGINE_URL", &raw)?,
            api_token: std::env::var("ENGINE_API_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            timeout_secs: env_number("ENGINE_TIMEOUT_SECS").unwrap_or(600),
            max_retries: env_number("ENGINE_MAX_RETRIES").unwrap_or(2),
        })
    }

    /// Configuration pointing at a local mock server (for testing).
    pub fn local(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("base_url", base_url)?,
            api_token: None,
            timeout_secs: 5,
            max_retries: 0,
        })
    }
}

/// Parse a base URL, forcing a trailing slash so relative joins append
/// to the path instead of replacing its last segment.
fn parse_base_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(
            var.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn env_number<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ENGINE_URL environment variable is required")]
    MissingUrl,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("ENGINE_API_TOKEN is not a valid HTTP header value")]
    InvalidToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_builds_valid_config() {
        let cfg = EngineConfig::local("http://127.0.0.1:9000").unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.max_retries, 0);
    }

    #[test]
    fn base_path_gets_trailing_slash() {
        let url = parse_base_url("X", "https://gpu.internal/engine").unwrap();
        assert_eq!(url.join("infer").unwrap().as_str(), "https://gpu.internal/engine/infer");
    }

    #[test]
    fn rejects_invalid_url() {
        assert!(matches!(
            parse_base_url("X", "not a url"),
            Err(ConfigError::InvalidUrl(..))
        ));
        assert!(parse_base_url("X", "mailto:ops@example.com").is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let mut cfg = EngineConfig::local("http://127.0.0.1:9000").unwrap();
        cfg.api_token = Some("super-secret".into());
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
