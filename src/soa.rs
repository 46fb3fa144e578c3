// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! SOA negotiation.
//!
//! The SOA published with a change is assembled field by field:
//!
//! 1. an explicit override from the desired-state document
//! 2. the value found in the live SOA
//! 3. for the serial only, a value computed from the [`SerialStrategy`]
//! 4. a hardcoded fallback (`ns.<origin>`, `hostmaster.<origin>`, 3600/600/604800/86400)
//!
//! A computed serial always ends up strictly greater than the live serial, even
//! when several applies happen on the same day or the clock runs behind the
//! value already published. An explicit serial override is used verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::constants::{
    DEFAULT_ADMIN_MAILBOX_LABEL, DEFAULT_PRIMARY_NS_LABEL, DEFAULT_SOA_EXPIRE_SECS,
    DEFAULT_SOA_MINIMUM_SECS, DEFAULT_SOA_REFRESH_SECS, DEFAULT_SOA_RETRY_SECS, SOA_FIELD_COUNT,
};
use crate::errors::MalformedSoaError;
use crate::record::{ensure_absolute, Record};

/// Policy for generating a new SOA serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialStrategy {
    /// `YYYYMMDD00` in UTC
    #[default]
    Date,
    /// Unix time in seconds
    Epoch,
}

impl SerialStrategy {
    /// Configuration spelling of this strategy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Epoch => "epoch",
        }
    }

    /// The serial this strategy would choose at `now`, ignoring any prior serial.
    #[must_use]
    pub fn candidate(&self, now: DateTime<Utc>) -> u32 {
        match self {
            Self::Epoch => u32::try_from(now.timestamp()).unwrap_or(u32::MAX),
            Self::Date => now
                .format("%Y%m%d00")
                .to_string()
                .parse()
                .unwrap_or(u32::MAX),
        }
    }
}

impl fmt::Display for SerialStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerialStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "epoch" => Ok(Self::Epoch),
            other => Err(format!(
                "unsupported serial strategy '{other}', expected 'date' or 'epoch'"
            )),
        }
    }
}

/// Optional SOA fields supplied by the desired-state document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SoaOverrides {
    pub primary_ns: Option<String>,
    pub admin_email: Option<String>,
    pub serial: Option<u32>,
    pub refresh: Option<u32>,
    pub retry: Option<u32>,
    pub expire: Option<u32>,
    pub minimum: Option<u32>,
}

/// A fully resolved SOA, ready to render or publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoaConfig {
    /// Primary nameserver (MNAME)
    pub primary_ns: String,
    /// Responsible mailbox in DNS form (RNAME)
    pub admin_email: String,
    /// Zone serial
    pub serial: u32,
    /// Secondary refresh interval
    pub refresh: u32,
    /// Secondary retry interval
    pub retry: u32,
    /// Secondary expiry
    pub expire: u32,
    /// Negative caching TTL
    pub minimum: u32,
}

impl SoaConfig {
    /// Parse the presentation value of an SOA record.
    ///
    /// Expected format: `mname rname serial refresh retry expire minimum`.
    /// Parenthesised multi-line forms are accepted as long as the seven
    /// tokens are present.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSoaError`] when fewer than seven tokens are present
    /// or a numeric field is not a valid 32-bit unsigned integer.
    pub fn parse(value: &str) -> Result<Self, MalformedSoaError> {
        let parts: Vec<&str> = value
            .split_whitespace()
            .filter(|token| *token != "(" && *token != ")")
            .collect();

        if parts.len() < SOA_FIELD_COUNT {
            return Err(MalformedSoaError {
                value: value.to_string(),
                reason: format!(
                    "expected {SOA_FIELD_COUNT} fields, found {}",
                    parts.len()
                ),
            });
        }

        let number = |index: usize, field: &str| -> Result<u32, MalformedSoaError> {
            parts[index].parse().map_err(|_| MalformedSoaError {
                value: value.to_string(),
                reason: format!("{field} '{}' is not a valid number", parts[index]),
            })
        };

        Ok(Self {
            primary_ns: parts[0].to_string(),
            admin_email: parts[1].to_string(),
            serial: number(2, "serial")?,
            refresh: number(3, "refresh")?,
            retry: number(4, "retry")?,
            expire: number(5, "expire")?,
            minimum: number(6, "minimum")?,
        })
    }

    /// Presentation value of this SOA (single line).
    #[must_use]
    pub fn to_value(&self) -> String {
        format!(
            "{} {} {} {} {} {} {}",
            self.primary_ns,
            self.admin_email,
            self.serial,
            self.refresh,
            self.retry,
            self.expire,
            self.minimum
        )
    }
}

/// Return a serial that satisfies `strategy` and strictly exceeds `current_serial`.
///
/// # Errors
///
/// Returns [`MalformedSoaError`] when `current_serial` is `u32::MAX`, since no
/// 32-bit serial exceeds it. Rolling over (RFC 1982) needs an explicit serial
/// override.
pub fn suggest_serial(
    strategy: SerialStrategy,
    current_serial: Option<u32>,
    now: DateTime<Utc>,
) -> Result<u32, MalformedSoaError> {
    let candidate = strategy.candidate(now);
    match current_serial {
        Some(current) if candidate <= current => {
            current.checked_add(1).ok_or_else(|| MalformedSoaError {
                value: current.to_string(),
                reason: "serial is at the 32-bit limit; set an explicit serial override"
                    .to_string(),
            })
        }
        _ => Ok(candidate),
    }
}

/// Combines overrides, the live SOA and the serial strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoaNegotiator {
    strategy: SerialStrategy,
}

impl SoaNegotiator {
    #[must_use]
    pub fn new(strategy: SerialStrategy) -> Self {
        Self { strategy }
    }

    /// Resolve the SOA to publish for `origin` using the current time.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSoaError`] if the live SOA cannot be parsed.
    pub fn negotiate(
        &self,
        origin: &str,
        overrides: Option<&SoaOverrides>,
        live_soa: Option<&Record>,
    ) -> Result<SoaConfig, MalformedSoaError> {
        self.negotiate_at(origin, overrides, live_soa, Utc::now())
    }

    /// Resolve the SOA to publish for `origin` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSoaError`] if the live SOA cannot be parsed.
    pub fn negotiate_at(
        &self,
        origin: &str,
        overrides: Option<&SoaOverrides>,
        live_soa: Option<&Record>,
        now: DateTime<Utc>,
    ) -> Result<SoaConfig, MalformedSoaError> {
        let live = live_soa
            .map(|record| SoaConfig::parse(&record.value))
            .transpose()?;
        let empty = SoaOverrides::default();
        let overrides = overrides.unwrap_or(&empty);
        let origin = ensure_absolute(origin);

        let serial = match overrides.serial {
            Some(serial) => {
                debug!("Using explicit SOA serial override {serial} for {origin}");
                serial
            }
            None => suggest_serial(
                self.strategy,
                live.as_ref().map(|soa| soa.serial),
                now,
            )?,
        };

        let primary_ns = overrides
            .primary_ns
            .clone()
            .or_else(|| live.as_ref().map(|soa| soa.primary_ns.clone()))
            .unwrap_or_else(|| format!("{DEFAULT_PRIMARY_NS_LABEL}.{origin}"));
        let admin_email = overrides
            .admin_email
            .clone()
            .or_else(|| live.as_ref().map(|soa| soa.admin_email.clone()))
            .unwrap_or_else(|| format!("{DEFAULT_ADMIN_MAILBOX_LABEL}.{origin}"));

        let timer = |choice: Option<u32>, field: fn(&SoaConfig) -> u32, fallback: u32| {
            choice
                .or_else(|| live.as_ref().map(field))
                .unwrap_or(fallback)
        };

        Ok(SoaConfig {
            primary_ns,
            admin_email,
            serial,
            refresh: timer(overrides.refresh, |s| s.refresh, DEFAULT_SOA_REFRESH_SECS),
            retry: timer(overrides.retry, |s| s.retry, DEFAULT_SOA_RETRY_SECS),
            expire: timer(overrides.expire, |s| s.expire, DEFAULT_SOA_EXPIRE_SECS),
            minimum: timer(overrides.minimum, |s| s.minimum, DEFAULT_SOA_MINIMUM_SECS),
        })
    }
}

#[cfg(test)]
#[path = "soa_tests.rs"]
mod soa_tests;
