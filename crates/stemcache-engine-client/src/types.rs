//! Wire types for the compute backend's `/infer` endpoint.
//!
//! Every field is optional: the engine is free to omit `cache_id`, `status`,
//! or either result shape. Presence is checked explicitly when the response
//! is turned into an [`EngineOutcome`].

use serde::Deserialize;
use stemcache_core::{NamedPart, RawResult};

/// Response body of `POST /infer`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InferResponse {
    #[serde(default)]
    pub cache_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub stems: Option<Vec<WireStem>>,
}

/// A named stem as sent by the engine. Older engines key the location as `url`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireStem {
    pub name: String,
    #[serde(alias = "url")]
    pub location: String,
}

/// Result of a successful delegation, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutcome {
    /// Cache key the engine used, if it reported one.
    pub cache_id: Option<String>,
    /// Engine-reported status string, if any.
    pub status: Option<String>,
    pub raw: RawResult,
}

impl From<InferResponse> for EngineOutcome {
    fn from(resp: InferResponse) -> Self {
        Self {
            cache_id: resp.cache_id.filter(|id| !id.is_empty()),
            status: resp.status.filter(|s| !s.is_empty()),
            raw: RawResult {
                named: resp.stems.map(|stems| {
                    stems
                        .into_iter()
                        .map(|s| NamedPart::new(s.name, s.location))
                        .collect()
                }),
                positional: resp.files.unwrap_or_default(),
            },
        }
    }
}
