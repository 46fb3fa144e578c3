// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Canonical DNS resource record model.
//!
//! A [`Record`] keeps the owner, type and value exactly as they were supplied
//! (from YAML or from a zone transfer). Comparisons never use those raw fields
//! directly; they go through the canonical forms:
//!
//! - **name** - fully qualified, lower-cased; `@` and the empty string become `.`
//! - **type** - upper-cased
//! - **value** - hostnames in `CNAME`/`NS`/`PTR`/`MX` values and the `SRV` target
//!   are fully qualified and lower-cased, everything else is trimmed as-is
//!
//! The identity [`RecordKey`] is built from those three canonical forms (with
//! the priority prefixed to the value). TTL is deliberately left out so that a
//! TTL-only change can be told apart from a value change.
//!
//! # Example
//!
//! ```rust
//! use bindsync::record::Record;
//!
//! let record = Record::new("WWW.Example.com", "a", 300, "192.0.2.1");
//! assert_eq!(record.canonical_name(), "www.example.com.");
//! assert_eq!(record.canonical_type(), "A");
//! assert_eq!(record.owner_for_zone("example.com."), "www");
//! ```

use serde::{Deserialize, Serialize};

/// Identity of a record for diff purposes: (canonical name, canonical type, canonical value).
pub type RecordKey = (String, String, String);

/// Record types whose whole value is a domain name.
const HOSTNAME_VALUE_TYPES: &[&str] = &["CNAME", "NS", "PTR", "MX"];

/// Record types that carry a priority / preference.
pub const PRIORITY_TYPES: &[&str] = &["MX", "SRV"];

/// A single DNS resource record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Owner name, possibly relative
    pub name: String,
    /// RR type, case-insensitive
    #[serde(rename = "type")]
    pub rtype: String,
    /// Time to live in seconds
    pub ttl: u32,
    /// Type-specific presentation value
    pub value: String,
    /// Priority / preference for MX and SRV records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

impl Record {
    /// Create a record without a priority.
    pub fn new(
        name: impl Into<String>,
        rtype: impl Into<String>,
        ttl: u32,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rtype: rtype.into(),
            ttl,
            value: value.into(),
            priority: None,
        }
    }

    /// Set the priority (MX preference, SRV priority).
    #[must_use]
    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Return the canonical fully qualified owner name.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        canonical_name(&self.name)
    }

    /// Return the canonical RR type.
    #[must_use]
    pub fn canonical_type(&self) -> String {
        self.rtype.trim().to_ascii_uppercase()
    }

    /// Return the canonicalised value used for comparisons.
    ///
    /// When a priority is present it is prefixed, so `10 mail.example.com.`
    /// and `20 mail.example.com.` are distinct values.
    #[must_use]
    pub fn canonical_value(&self) -> String {
        let rtype = self.canonical_type();
        let trimmed = self.value.trim();

        let value = if HOSTNAME_VALUE_TYPES.contains(&rtype.as_str()) {
            canonical_name(trimmed)
        } else if rtype == "SRV" {
            let mut parts: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
            if let Some(target) = parts.last_mut() {
                *target = canonical_name(target);
            }
            parts.join(" ")
        } else {
            trimmed.to_string()
        };

        match self.priority {
            Some(priority) => format!("{priority} {value}"),
            None => value,
        }
    }

    /// Return the owner label relative to the provided origin.
    ///
    /// - the origin itself becomes `@`
    /// - a name below the origin loses the origin suffix (`www.example.com.` → `www`)
    /// - anything else is returned as the absolute canonical name
    #[must_use]
    pub fn owner_for_zone(&self, origin: &str) -> String {
        let origin = canonical_name(origin);
        let name = self.canonical_name();

        if name == origin {
            return "@".to_string();
        }
        if origin == "." {
            return name.trim_end_matches('.').to_string();
        }
        match name.strip_suffix(&origin) {
            Some(relative) if relative.ends_with('.') => {
                relative.trim_end_matches('.').to_string()
            }
            _ => name,
        }
    }

    /// Return the identity key used for equality checks.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        (
            self.canonical_name(),
            self.canonical_type(),
            self.canonical_value(),
        )
    }

    /// Whether this is the zone's Start-of-Authority record.
    #[must_use]
    pub fn is_soa(&self) -> bool {
        self.canonical_type() == "SOA"
    }

    /// Presentation value with the priority prefixed for MX and SRV records.
    ///
    /// This is the value as it appears in a master file.
    #[must_use]
    pub fn presentation_value(&self) -> String {
        match self.priority {
            Some(priority) if PRIORITY_TYPES.contains(&self.canonical_type().as_str()) => {
                format!("{priority} {}", self.value.trim())
            }
            _ => self.value.trim().to_string(),
        }
    }
}

/// Return a fully qualified name with a trailing dot.
///
/// `@` and the empty string denote the root (`.`). Case is preserved.
#[must_use]
pub fn ensure_absolute(name: &str) -> String {
    let stripped = name.trim();
    if stripped.is_empty() || stripped == "@" {
        return ".".to_string();
    }
    if stripped.ends_with('.') {
        stripped.to_string()
    } else {
        format!("{stripped}.")
    }
}

/// Return the canonical (absolute, lower-cased) form of an owner name.
#[must_use]
pub fn canonical_name(name: &str) -> String {
    ensure_absolute(name).to_ascii_lowercase()
}

/// Expand an owner as written in a zone description against `origin`.
///
/// `@`, the empty string and `.` denote the origin itself, absolute names are
/// kept, and relative labels get the origin appended.
#[must_use]
pub fn expand_owner(owner: &str, origin: &str) -> String {
    let owner = owner.trim();
    let origin = ensure_absolute(origin);

    if owner.is_empty() || owner == "@" || owner == "." {
        return origin;
    }
    if owner.ends_with('.') {
        return owner.to_string();
    }
    if origin == "." {
        return format!("{owner}.");
    }
    format!("{owner}.{origin}")
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
