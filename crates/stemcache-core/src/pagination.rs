//! # History Pagination
//!
//! [`PageRequest`] is built from raw query-string values and never fails:
//! anything absent, non-numeric, or below 1 falls back to the default. The
//! page size is also capped so a single request cannot pull an unbounded
//! history.
//!
//! [`paginate`] is the in-memory ordering rule shared by every backend that
//! cannot push ordering down to its store: newest `created_at` first, ties
//! broken by most recently appended.

use crate::records::HistoryRecord;

/// Page used when none (or an invalid one) is supplied. Pages are 1-indexed.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when none (or an invalid one) is supplied.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size served.
pub const MAX_LIMIT: u32 = 100;

/// A coerced, always-valid pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Coerce numeric inputs. Values below 1 become the defaults.
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: coerce(Some(page), DEFAULT_PAGE, u32::MAX),
            limit: coerce(Some(limit), DEFAULT_LIMIT, MAX_LIMIT),
        }
    }

    /// Coerce raw query-string values.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: coerce(parse(page), DEFAULT_PAGE, u32::MAX),
            limit: coerce(parse(limit), DEFAULT_LIMIT, MAX_LIMIT),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

fn coerce(value: Option<i64>, default: u32, max: u32) -> u32 {
    match value {
        Some(v) if v >= 1 => u32::try_from(v).unwrap_or(max).min(max),
        _ => default,
    }
}

/// One page of a submitter's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    /// Full size of the submitter's history, independent of pagination.
    pub total: u64,
    /// Records on this page, newest first.
    pub items: Vec<HistoryRecord>,
}

/// Order `records` (given in append order) newest first and cut out one page.
pub fn paginate(records: &[HistoryRecord], request: PageRequest) -> HistoryPage {
    let mut ordered: Vec<&HistoryRecord> = records.iter().rev().collect();
    // Stable sort over the reversed list keeps later appends first on ties.
    ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let items = ordered
        .into_iter()
        .skip(offset)
        .take(request.limit() as usize)
        .cloned()
        .collect();

    HistoryPage {
        total: records.len() as u64,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FingerprintComputer;
    use crate::identity::SubmitterId;
    use chrono::{Duration, TimeZone, Utc};

    fn record_at(submitter: SubmitterId, minute: i64) -> HistoryRecord {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        HistoryRecord::new(
            submitter,
            format!("track-{minute}.wav"),
            FingerprintComputer::compute_bytes(minute.to_string().as_bytes()),
            vec![],
            base + Duration::minutes(minute),
        )
    }

    #[test]
    fn defaults() {
        let req = PageRequest::default();
        assert_eq!((req.page(), req.limit()), (1, 10));
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn malformed_query_values_fall_back_to_defaults() {
        let req = PageRequest::from_query(Some("abc"), Some("-5"));
        assert_eq!((req.page(), req.limit()), (1, 10));

        let req = PageRequest::from_query(Some("0"), Some("0"));
        assert_eq!((req.page(), req.limit()), (1, 10));

        let req = PageRequest::from_query(Some(""), None);
        assert_eq!((req.page(), req.limit()), (1, 10));

        let req = PageRequest::from_query(Some("1.5"), Some("99999999999999999999"));
        assert_eq!((req.page(), req.limit()), (1, 10));
    }

    #[test]
    fn numeric_inputs_are_coerced() {
        assert_eq!(PageRequest::new(-3, 25), PageRequest::from_query(None, Some("25")));
        let req = PageRequest::new(3, 20);
        assert_eq!((req.page(), req.limit()), (3, 20));
        assert_eq!(req.offset(), 40);
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(PageRequest::from_query(None, Some("5000")).limit(), MAX_LIMIT);
        assert_eq!(PageRequest::new(1, i64::MAX).limit(), MAX_LIMIT);
    }

    #[test]
    fn huge_page_is_clamped_and_yields_empty_items() {
        let submitter = SubmitterId::new();
        let records: Vec<_> = (0..3).map(|m| record_at(submitter, m)).collect();
        let page = paginate(&records, PageRequest::new(i64::MAX, 10));
        assert_eq!(page.total, 3);
        assert!(page.items.is_empty());
    }

    #[test]
    fn second_page_of_twenty_five_is_items_eleven_to_twenty() {
        let submitter = SubmitterId::new();
        // Append out of chronological order to exercise the sort.
        let mut minutes: Vec<i64> = (0..25).collect();
        minutes.reverse();
        minutes.swap(3, 17);
        let records: Vec<_> = minutes.iter().map(|&m| record_at(submitter, m)).collect();

        let page = paginate(&records, PageRequest::new(2, 10));
        assert_eq!(page.total, 25);
        assert_eq!(page.items.len(), 10);

        // Newest is minute 24; items 11..=20 are minutes 14 down to 5.
        let got: Vec<_> = page.items.iter().map(|r| r.source_name.clone()).collect();
        let want: Vec<_> = (5..=14).rev().map(|m| format!("track-{m}.wav")).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn ties_are_broken_by_latest_append() {
        let submitter = SubmitterId::new();
        let mut first = record_at(submitter, 0);
        first.source_name = "first".into();
        let mut second = record_at(submitter, 0);
        second.source_name = "second".into();

        let page = paginate(&[first, second], PageRequest::default());
        assert_eq!(page.items[0].source_name, "second");
        assert_eq!(page.items[1].source_name, "first");
    }

    #[test]
    fn empty_history() {
        let page = paginate(&[], PageRequest::default());
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }
}
