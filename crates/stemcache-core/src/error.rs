//! # Error Types
//!
//! Errors raised by the pure core. Storage, transport and HTTP errors live in
//! the crates that own those concerns.

use thiserror::Error;

/// Error while computing or validating a content fingerprint.
#[derive(Error, Debug)]
pub enum FingerprintError {
    /// The artifact stream could not be read to completion.
    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),

    /// A fingerprint string received from outside did not pass validation.
    #[error("invalid fingerprint {value:?}: {reason}")]
    Invalid {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}
