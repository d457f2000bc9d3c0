//! Compute backend client error types.

use std::path::PathBuf;

/// Errors from compute backend calls.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Transport failure: connect, timeout, or body I/O.
    #[error("compute backend unavailable calling {endpoint}: {source}")]
    Unavailable {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The engine answered with a non-2xx status.
    #[error("compute backend {endpoint} returned {status}: {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The engine answered 2xx with a body that does not match the contract.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The artifact could not be opened for upload.
    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl EngineError {
    /// The engine's raw error payload, when it sent one.
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            Self::Rejected { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }

    /// Whether the request never reached the engine, so re-sending is safe.
    pub(crate) fn is_connect_failure(&self) -> bool {
        matches!(self, Self::Unavailable { source, .. } if source.is_connect())
    }
}
