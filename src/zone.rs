// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone state: an origin, its ordered records and an optional default TTL.
//!
//! The same type describes both the desired zone (loaded from YAML) and the
//! current zone (fetched by AXFR).

use glob::{MatchOptions, Pattern};
use std::collections::BTreeMap;
use tracing::debug;

use crate::errors::ValidationError;
use crate::record::{ensure_absolute, Record, RecordKey};

/// The full record set of one DNS zone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZoneState {
    /// Absolute zone name
    pub origin: String,
    /// Records in insertion order
    pub records: Vec<Record>,
    /// `$TTL` of the zone, when known
    pub default_ttl: Option<u32>,
}

impl ZoneState {
    /// Create an empty zone for `origin`.
    pub fn new(origin: impl AsRef<str>) -> Self {
        Self {
            origin: ensure_absolute(origin.as_ref()),
            records: Vec::new(),
            default_ttl: None,
        }
    }

    /// Replace the records.
    #[must_use]
    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    /// Set the default TTL.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: u32) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Iterate over all records in order.
    pub fn iter_records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Return the first SOA record, if any.
    #[must_use]
    pub fn find_soa(&self) -> Option<&Record> {
        self.records.iter().find(|record| record.is_soa())
    }

    /// Return the records keyed by identity (last write wins on duplicates).
    #[must_use]
    pub fn index(&self) -> BTreeMap<RecordKey, &Record> {
        self.records
            .iter()
            .map(|record| (record.key(), record))
            .collect()
    }

    /// Return a copy without records whose canonical owner matches `filter`.
    ///
    /// SOA records are never removed.
    #[must_use]
    pub fn without_ignored(&self, filter: &IgnoreFilter) -> ZoneState {
        if filter.is_empty() {
            return self.clone();
        }

        let records: Vec<Record> = self
            .records
            .iter()
            .filter(|record| record.is_soa() || !filter.matches(&record.canonical_name()))
            .cloned()
            .collect();

        debug!(
            "Ignore patterns removed {} of {} records from {}",
            self.records.len() - records.len(),
            self.records.len(),
            self.origin
        );

        ZoneState {
            origin: self.origin.clone(),
            records,
            default_ttl: self.default_ttl,
        }
    }
}

/// Compiled glob patterns matched case-insensitively against owner names.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    patterns: Vec<Pattern>,
}

impl IgnoreFilter {
    /// Compile `patterns`; patterns are lower-cased before compilation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIgnorePattern`] for an invalid glob.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ValidationError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Pattern::new(&pattern.to_ascii_lowercase()).map_err(|e| {
                    ValidationError::InvalidIgnorePattern {
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Whether no pattern is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `name` matches any pattern.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        let lowered = name.to_ascii_lowercase();
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(&lowered, options))
    }
}

#[cfg(test)]
#[path = "zone_tests.rs"]
mod zone_tests;
