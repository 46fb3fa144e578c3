// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for zone state and ignore filtering.

#[cfg(test)]
mod tests {
    use crate::errors::ValidationError;
    use crate::record::Record;
    use crate::zone::{IgnoreFilter, ZoneState};

    fn live_zone() -> ZoneState {
        ZoneState::new("example.com").with_records(vec![
            Record::new(
                "example.com.",
                "SOA",
                3600,
                "ns1.example.com. hostmaster.example.com. 2025010100 3600 600 604800 86400",
            ),
            Record::new("www.example.com.", "A", 300, "192.0.2.1"),
            Record::new("_acme-challenge.example.com.", "TXT", 60, "\"token\""),
            Record::new("_ACME-challenge.www.example.com.", "TXT", 60, "\"token2\""),
        ])
    }

    #[test]
    fn test_new_makes_origin_absolute() {
        let zone = ZoneState::new("example.com");
        assert_eq!(zone.origin, "example.com.");
        assert!(zone.records.is_empty());
        assert_eq!(zone.default_ttl, None);
    }

    #[test]
    fn test_find_soa() {
        let zone = live_zone();
        let soa = zone.find_soa().expect("SOA present");
        assert!(soa.value.starts_with("ns1.example.com."));

        let empty = ZoneState::new("example.com.");
        assert!(empty.find_soa().is_none());
    }

    #[test]
    fn test_index_collapses_duplicates() {
        let zone = ZoneState::new("example.com.").with_records(vec![
            Record::new("www.example.com.", "A", 300, "192.0.2.1"),
            Record::new("WWW.example.com.", "a", 600, "192.0.2.1"),
        ]);

        let index = zone.index();
        assert_eq!(index.len(), 1);
        let record = index.values().next().unwrap();
        assert_eq!(record.ttl, 600);
    }

    #[test]
    fn test_ignore_filter_is_case_insensitive() {
        let filter = IgnoreFilter::new(&["_acme-challenge.*"]).unwrap();
        assert!(filter.matches("_acme-challenge.example.com."));
        assert!(filter.matches("_ACME-Challenge.www.example.com."));
        assert!(!filter.matches("www.example.com."));
    }

    #[test]
    fn test_without_ignored_keeps_soa() {
        let filter = IgnoreFilter::new(&["*"]).unwrap();
        let filtered = live_zone().without_ignored(&filter);

        assert_eq!(filtered.records.len(), 1);
        assert!(filtered.records[0].is_soa());
    }

    #[test]
    fn test_without_ignored_removes_matching_records() {
        let filter = IgnoreFilter::new(&["_ACME-CHALLENGE.*"]).unwrap();
        let filtered = live_zone().without_ignored(&filter);

        let names: Vec<String> = filtered
            .iter_records()
            .map(Record::canonical_name)
            .collect();
        assert_eq!(names, vec!["example.com.", "www.example.com."]);
    }

    #[test]
    fn test_without_ignored_with_no_patterns_is_identity() {
        let filter = IgnoreFilter::new::<&str>(&[]).unwrap();
        assert!(filter.is_empty());
        assert_eq!(live_zone().without_ignored(&filter), live_zone());
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let result = IgnoreFilter::new(&["[unclosed"]);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidIgnorePattern { pattern, .. }) if pattern == "[unclosed"
        ));
    }
}
