//! # Content Fingerprints
//!
//! A [`Fingerprint`] is the cache key for an artifact: the lowercase hex
//! SHA-256 digest of its complete byte content. [`FingerprintComputer`] reads
//! the artifact in fixed-size chunks so arbitrarily large uploads never have
//! to reside in memory.
//!
//! Fingerprints echoed back by the compute backend (`cache_id`) go through
//! [`Fingerprint::parse`], which accepts any opaque identifier made of
//! characters that are safe to use as a storage key.

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::FingerprintError;

/// Read buffer size for streaming digests.
const CHUNK_SIZE: usize = 64 * 1024;

/// Upper bound on externally supplied fingerprint length.
const MAX_EXTERNAL_LEN: usize = 128;

/// Content fingerprint used as the unique cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Build a fingerprint from a raw 32-byte SHA-256 digest.
    pub fn from_digest(bytes: [u8; 32]) -> Self {
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Validate an externally supplied identifier.
    ///
    /// Accepts 1..=128 characters drawn from ASCII alphanumerics, `-` and `_`.
    pub fn parse(value: &str) -> Result<Self, FingerprintError> {
        let invalid = |reason| FingerprintError::Invalid {
            value: value.to_string(),
            reason,
        };
        if value.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if value.len() > MAX_EXTERNAL_LEN {
            return Err(invalid("longer than 128 characters"));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid("contains characters outside [A-Za-z0-9_-]"));
        }
        Ok(Self(value.to_string()))
    }

    /// Borrow the fingerprint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the fingerprint, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Streaming SHA-256 fingerprinting of artifacts.
pub struct FingerprintComputer;

impl FingerprintComputer {
    /// Digest everything `reader` yields until end of stream.
    ///
    /// Interrupted reads are retried; any other read error aborts with
    /// [`FingerprintError::Io`].
    pub fn compute<R: Read>(mut reader: R) -> Result<Fingerprint, FingerprintError> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FingerprintError::Io(e)),
            };
            hasher.update(&buf[..n]);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Ok(Fingerprint::from_digest(bytes))
    }

    /// Open `path` read-only and digest its content.
    pub fn compute_file(path: &Path) -> Result<Fingerprint, FingerprintError> {
        let file = File::open(path)?;
        Self::compute(file)
    }

    /// Digest an in-memory buffer.
    pub fn compute_bytes(data: &[u8]) -> Fingerprint {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&Sha256::digest(data));
        Fingerprint::from_digest(bytes)
    }
}
