//! # API Route Modules
//!
//! - `inference`: artifact submission and submitter history.
//! - `submitters`: submitter profile provisioning.
//!
//! Health probes and `/metrics` are mounted in [`crate::app`], outside auth.

pub mod inference;
pub mod submitters;
