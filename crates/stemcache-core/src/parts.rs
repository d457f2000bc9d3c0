//! # Result Normalization
//!
//! Processed results come in two shapes: a list of named parts, or a bare
//! list of output locations from older backends and older stored records.
//! [`normalize`] turns either into the canonical ordered `Vec<NamedPart>`.

use serde::{Deserialize, Serialize};

/// One labeled output of a processed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPart {
    /// Human-facing label, e.g. `"Vocals"`.
    pub name: String,
    /// Resolvable output location (URI).
    pub location: String,
}

impl NamedPart {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

/// A result before normalization.
///
/// `named` is `None` when the producer did not send the named shape at all;
/// `Some(vec![])` is treated the same as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResult {
    pub named: Option<Vec<NamedPart>>,
    pub positional: Vec<String>,
}

impl RawResult {
    /// A result carrying only named parts.
    pub fn named(parts: Vec<NamedPart>) -> Self {
        Self {
            named: Some(parts),
            positional: Vec::new(),
        }
    }

    /// A result carrying only bare locations.
    pub fn positional(locations: Vec<String>) -> Self {
        Self {
            named: None,
            positional: locations,
        }
    }
}

/// Synthetic label for the `index`-th (0-based) positional location.
pub fn positional_name(index: usize) -> String {
    format!("Stem {}", index + 1)
}

/// Reduce a [`RawResult`] to the canonical ordered list of named parts.
///
/// Non-empty named parts win and pass through unchanged. Otherwise every
/// positional location is labeled `Stem 1`, `Stem 2`, ... in order.
pub fn normalize(raw: RawResult) -> Vec<NamedPart> {
    match raw.named {
        Some(named) if !named.is_empty() => named,
        _ => raw
            .positional
            .into_iter()
            .enumerate()
            .map(|(i, location)| NamedPart {
                name: positional_name(i),
                location,
            })
            .collect(),
    }
}

/// Flattened location view of `parts`, in order.
pub fn locations(parts: &[NamedPart]) -> Vec<String> {
    parts.iter().map(|p| p.location.clone()).collect()
}
