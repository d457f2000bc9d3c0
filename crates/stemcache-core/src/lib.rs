//! # stemcache-core — Foundational Types for stemcache
//!
//! The leaf of the workspace dependency graph. Defines the types that every
//! other crate agrees on: the content [`Fingerprint`] used as the cache key,
//! the canonical [`NamedPart`] result shape and its [`normalize`] rule, the
//! stored [`CacheEntry`] and [`HistoryRecord`] records, and the coercing
//! [`PageRequest`] used by history listings.
//!
//! ## Key Design Principles
//!
//! 1. **Content addressing.** A fingerprint is the SHA-256 of the complete
//!    artifact bytes, streamed through [`FingerprintComputer`]. Identical
//!    bytes always produce the same cache key.
//!
//! 2. **One result shape.** Results arrive either as named parts or as a bare
//!    list of locations. [`normalize`] is the only place that reconciles the
//!    two, and it is applied on every read path, so legacy records stay
//!    servable without a migration.
//!
//! 3. **Pagination never fails.** [`PageRequest`] coerces malformed query
//!    input to defaults instead of rejecting it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `stemcache-*` crates.
//! - No network or database access; the only I/O is `std::io::Read`.
//! - No `.unwrap()` outside tests.

pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod pagination;
pub mod parts;
pub mod records;
pub mod temporal;

pub use error::FingerprintError;
pub use fingerprint::{Fingerprint, FingerprintComputer};
pub use identity::SubmitterId;
pub use pagination::{paginate, HistoryPage, PageRequest};
pub use parts::{locations, normalize, positional_name, NamedPart, RawResult};
pub use records::{CacheEntry, HistoryRecord};
pub use temporal::format_timestamp;
