// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record-level diff between a desired and a current zone.
//!
//! Both zones are indexed by record identity (canonical owner, type and
//! value). Values under one owner/type are independent: adding a third `A`
//! record never touches the two that already exist.
//!
//! SOA records never appear in a [`ZoneDiff`]; the serial and timers are
//! negotiated separately by [`crate::soa`].

use serde::Serialize;

use crate::record::Record;
use crate::zone::ZoneState;

/// Changes needed to turn the current zone into the desired zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZoneDiff {
    /// Present in desired, absent in current
    pub added: Vec<Record>,
    /// Present in current, absent in desired
    pub removed: Vec<Record>,
    /// Same identity, different TTL: (current, desired)
    pub ttl_changed: Vec<(Record, Record)>,
}

impl ZoneDiff {
    /// Whether applying this diff would change anything.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.ttl_changed.is_empty())
    }

    /// Total number of change entries.
    #[must_use]
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.ttl_changed.len()
    }
}

/// Produce the diff between `desired` and `current`.
///
/// Output is deterministic: records are visited in (owner, type, value) order.
/// Records that share an identity within one state collapse to the last one
/// seen.
#[must_use]
pub fn diff_zones(desired: &ZoneState, current: &ZoneState) -> ZoneDiff {
    let desired_index = desired.index();
    let current_index = current.index();

    let mut diff = ZoneDiff::default();
    for (key, record) in desired_index.iter().filter(|(_, record)| !record.is_soa()) {
        match current_index.get(key) {
            None => diff.added.push((*record).clone()),
            Some(current_record) if current_record.ttl != record.ttl => {
                diff.ttl_changed
                    .push(((*current_record).clone(), (*record).clone()));
            }
            Some(_) => {}
        }
    }

    diff.removed = current_index
        .iter()
        .filter(|(key, record)| !record.is_soa() && !desired_index.contains_key(*key))
        .map(|(_, record)| (*record).clone())
        .collect();

    diff
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod diff_tests;
