//! Timestamp rendering for submitter-facing responses.

use chrono::{DateTime, SecondsFormat, Utc};

/// Render a UTC timestamp as RFC 3339 with seconds precision and a `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
