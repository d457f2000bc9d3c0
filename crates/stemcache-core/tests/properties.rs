//! # Property Tests for stemcache-core
//!
//! Fingerprint determinism, normalization shape rules, and pagination
//! bounds, checked over generated inputs.

use std::io::Cursor;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use stemcache_core::{
    normalize, paginate, FingerprintComputer, HistoryRecord, NamedPart, PageRequest, RawResult,
    SubmitterId,
};

fn named_part() -> impl Strategy<Value = NamedPart> {
    ("[A-Za-z ]{1,12}", "https://cdn\\.example/[a-z0-9]{1,16}\\.wav")
        .prop_map(|(name, location)| NamedPart::new(name, location))
}

proptest! {
    /// Byte-identical input always yields the same fingerprint.
    #[test]
    fn fingerprint_deterministic(data in prop::collection::vec(any::<u8>(), 0..4096)) {
        let a = FingerprintComputer::compute(Cursor::new(&data)).unwrap();
        let b = FingerprintComputer::compute(Cursor::new(&data)).unwrap();
        prop_assert_eq!(a.as_str().len(), 64);
        prop_assert_eq!(a, b);
    }

    /// Appending a byte changes the fingerprint.
    #[test]
    fn fingerprint_sensitive_to_content(
        data in prop::collection::vec(any::<u8>(), 0..1024),
        extra in any::<u8>(),
    ) {
        let mut longer = data.clone();
        longer.push(extra);
        prop_assert_ne!(
            FingerprintComputer::compute_bytes(&data),
            FingerprintComputer::compute_bytes(&longer)
        );
    }

    /// Positional results keep their length and order and get 1-based labels.
    #[test]
    fn positional_normalization_labels(
        locations in prop::collection::vec("[a-z0-9/]{1,20}", 0..12)
    ) {
        let parts = normalize(RawResult::positional(locations.clone()));
        prop_assert_eq!(parts.len(), locations.len());
        for (i, part) in parts.iter().enumerate() {
            prop_assert_eq!(&part.location, &locations[i]);
            prop_assert_eq!(part.name.clone(), format!("Stem {}", i + 1));
        }
    }

    /// Non-empty named results pass through untouched.
    #[test]
    fn named_normalization_is_identity(
        parts in prop::collection::vec(named_part(), 1..8),
        positional in prop::collection::vec("[a-z]{1,8}", 0..4),
    ) {
        let raw = RawResult { named: Some(parts.clone()), positional };
        prop_assert_eq!(normalize(raw), parts);
    }

    /// A page never exceeds its limit and `total` ignores pagination.
    #[test]
    fn pages_are_bounded_and_sorted(
        offsets in prop::collection::vec(0i64..10_000, 0..60),
        page in -5i64..10,
        limit in -5i64..30,
    ) {
        let submitter = SubmitterId::new();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let records: Vec<HistoryRecord> = offsets
            .iter()
            .map(|&s| HistoryRecord::new(
                submitter,
                "a.wav",
                FingerprintComputer::compute_bytes(b"a"),
                vec![],
                base + Duration::seconds(s),
            ))
            .collect();

        let request = PageRequest::new(page, limit);
        let result = paginate(&records, request);

        prop_assert_eq!(result.total, records.len() as u64);
        prop_assert!(result.items.len() <= request.limit() as usize);
        for pair in result.items.windows(2) {
            prop_assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    /// Arbitrary query strings never fail to coerce.
    #[test]
    fn page_request_never_fails(page in ".{0,12}", limit in ".{0,12}") {
        let req = PageRequest::from_query(Some(&page), Some(&limit));
        prop_assert!(req.page() >= 1);
        prop_assert!((1..=100).contains(&req.limit()));
    }
}
