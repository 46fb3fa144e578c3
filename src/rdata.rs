// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Conversion between [`Record`] and hickory resource records.
//!
//! Zone transfers produce hickory records that are turned into presentation
//! text here. Dynamic updates go the other way. Supported types: `A`, `AAAA`,
//! `CNAME`, `NS`, `PTR`, `MX`, `TXT`, `SRV` and `CAA`. Transfers also accept
//! any other type through its presentation form; updates reject them.

use hickory_client::rr::{rdata, DNSClass, Name, RData, Record as DnsRecord};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use url::Url;

use crate::errors::ValidationError;
use crate::record::{ensure_absolute, Record};

/// Record types that can be sent in a dynamic update.
pub const UPDATABLE_TYPES: &[&str] = &[
    "A", "AAAA", "CNAME", "NS", "PTR", "MX", "TXT", "SRV", "CAA",
];

/// CAA flags value with the issuer-critical bit set.
const CAA_CRITICAL_FLAG: u8 = 128;

/// Convert a transferred record into the crate's record model.
///
/// MX and SRV records carry their priority separately; the SRV value is
/// `weight port target`. TXT strings are quoted.
#[must_use]
pub fn record_from_hickory(rr: &DnsRecord) -> Option<Record> {
    let data = rr.data()?;
    let name = rr.name().to_string();
    let rtype = rr.record_type().to_string();
    let ttl = rr.ttl();

    let record = match data {
        RData::A(a) => Record::new(name, rtype, ttl, a.0.to_string()),
        RData::AAAA(aaaa) => Record::new(name, rtype, ttl, aaaa.0.to_string()),
        RData::CNAME(cname) => Record::new(name, rtype, ttl, cname.0.to_string()),
        RData::NS(ns) => Record::new(name, rtype, ttl, ns.0.to_string()),
        RData::PTR(ptr) => Record::new(name, rtype, ttl, ptr.0.to_string()),
        RData::MX(mx) => {
            Record::new(name, rtype, ttl, mx.exchange().to_string()).with_priority(mx.preference())
        }
        RData::SRV(srv) => Record::new(
            name,
            rtype,
            ttl,
            format!("{} {} {}", srv.weight(), srv.port(), srv.target()),
        )
        .with_priority(srv.priority()),
        RData::TXT(txt) => {
            let strings: Vec<String> = txt
                .txt_data()
                .iter()
                .map(|bytes| quote(&String::from_utf8_lossy(bytes)))
                .collect();
            Record::new(name, rtype, ttl, strings.join(" "))
        }
        RData::CAA(caa) => {
            let flags = if caa.issuer_critical() {
                CAA_CRITICAL_FLAG
            } else {
                0
            };
            Record::new(
                name,
                rtype,
                ttl,
                format!("{flags} {} {}", caa.tag(), quote(&caa.value().to_string())),
            )
        }
        RData::SOA(soa) => Record::new(
            name,
            rtype,
            ttl,
            format!(
                "{} {} {} {} {} {} {}",
                soa.mname(),
                soa.rname(),
                soa.serial(),
                soa.refresh(),
                soa.retry(),
                soa.expire(),
                soa.minimum()
            ),
        ),
        other => Record::new(name, rtype, ttl, other.to_string()),
    };

    Some(record)
}

/// Build a hickory record (class `IN`) from a record.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidRecord`] when the type is not supported
/// for updates or the value cannot be parsed.
pub fn record_to_hickory(record: &Record) -> Result<DnsRecord, ValidationError> {
    let name = parse_name(record, &record.canonical_name())?;
    let mut rr = DnsRecord::from_rdata(name, record.ttl, rdata_from_record(record)?);
    rr.set_dns_class(DNSClass::IN);
    Ok(rr)
}

/// Build the rdata of a record.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidRecord`] when the type is not supported
/// for updates or the value cannot be parsed.
pub fn rdata_from_record(record: &Record) -> Result<RData, ValidationError> {
    let rtype = record.canonical_type();
    let value = record.value.trim();

    let rdata = match rtype.as_str() {
        "A" => RData::A(
            value
                .parse::<Ipv4Addr>()
                .map_err(|e| invalid(record, format!("invalid IPv4 address: {e}")))?
                .into(),
        ),
        "AAAA" => RData::AAAA(
            value
                .parse::<Ipv6Addr>()
                .map_err(|e| invalid(record, format!("invalid IPv6 address: {e}")))?
                .into(),
        ),
        "CNAME" => RData::CNAME(rdata::CNAME(parse_name(record, value)?)),
        "NS" => RData::NS(rdata::NS(parse_name(record, value)?)),
        "PTR" => RData::PTR(rdata::PTR(parse_name(record, value)?)),
        "MX" => {
            let (preference, exchange) = split_priority(record, 1)?;
            RData::MX(rdata::MX::new(preference, parse_name(record, &exchange)?))
        }
        "SRV" => {
            let (priority, rest) = split_priority(record, 3)?;
            let parts: Vec<&str> = rest.split_whitespace().collect();
            let [weight, port, target] = parts.as_slice() else {
                return Err(invalid(record, "SRV value must be 'weight port target'"));
            };
            RData::SRV(rdata::SRV::new(
                priority,
                parse_u16(record, "weight", weight)?,
                parse_u16(record, "port", port)?,
                parse_name(record, target)?,
            ))
        }
        "TXT" => RData::TXT(rdata::TXT::new(parse_character_strings(value))),
        "CAA" => RData::CAA(parse_caa(record, value)?),
        _ => {
            return Err(invalid(
                record,
                format!(
                    "type is not supported for dynamic updates (supported: {})",
                    UPDATABLE_TYPES.join(", ")
                ),
            ))
        }
    };

    Ok(rdata)
}

/// Split presentation text into character-strings.
///
/// Quoted segments keep their spaces and honour `\"` and `\\` escapes;
/// unquoted segments are split on whitespace.
#[must_use]
pub fn parse_character_strings(value: &str) -> Vec<String> {
    let mut strings = Vec::new();
    let mut chars = value.trim().chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut current = String::new();
        if c == '"' {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            current.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => current.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                current.push(c);
                chars.next();
            }
        }
        strings.push(current);
    }

    strings
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn invalid(record: &Record, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidRecord {
        name: record.name.clone(),
        rtype: record.canonical_type(),
        reason: reason.into(),
    }
}

fn parse_name(record: &Record, name: &str) -> Result<Name, ValidationError> {
    Name::from_str(&ensure_absolute(name))
        .map_err(|e| invalid(record, format!("invalid domain name '{name}': {e}")))
}

fn parse_u16(record: &Record, field: &str, value: &str) -> Result<u16, ValidationError> {
    value
        .parse()
        .map_err(|_| invalid(record, format!("{field} '{value}' is not a valid 16-bit number")))
}

/// Return (priority, remaining value) for MX/SRV.
///
/// Uses the record's priority when set, otherwise takes it from the first
/// token of a value that has `remaining_tokens + 1` tokens.
fn split_priority(
    record: &Record,
    remaining_tokens: usize,
) -> Result<(u16, String), ValidationError> {
    let value = record.value.trim();
    if let Some(priority) = record.priority {
        return Ok((priority, value.to_string()));
    }

    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() != remaining_tokens + 1 {
        return Err(invalid(record, "priority is required"));
    }
    Ok((
        parse_u16(record, "priority", tokens[0])?,
        tokens[1..].join(" "),
    ))
}

fn parse_caa(record: &Record, value: &str) -> Result<rdata::CAA, ValidationError> {
    let mut parts = value.splitn(3, char::is_whitespace);
    let (Some(flags), Some(tag), Some(raw_value)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid(record, "CAA value must be 'flags tag value'"));
    };

    let flags: u8 = flags
        .parse()
        .map_err(|_| invalid(record, format!("flags '{flags}' is not a valid number")))?;
    let issuer_critical = flags & CAA_CRITICAL_FLAG != 0;
    let caa_value = parse_character_strings(raw_value).concat();

    let issuer = |text: &str| -> Result<Option<Name>, ValidationError> {
        let domain = text.split(';').next().unwrap_or_default().trim();
        if domain.is_empty() {
            Ok(None)
        } else {
            Name::from_str(domain)
                .map(Some)
                .map_err(|e| invalid(record, format!("invalid CA domain name '{domain}': {e}")))
        }
    };

    match tag.to_ascii_lowercase().as_str() {
        "issue" => Ok(rdata::CAA::new_issue(
            issuer_critical,
            issuer(&caa_value)?,
            Vec::new(),
        )),
        "issuewild" => Ok(rdata::CAA::new_issuewild(
            issuer_critical,
            issuer(&caa_value)?,
            Vec::new(),
        )),
        "iodef" => {
            let url = Url::parse(&caa_value)
                .map_err(|e| invalid(record, format!("invalid iodef URL '{caa_value}': {e}")))?;
            Ok(rdata::CAA::new_iodef(issuer_critical, url))
        }
        other => Err(invalid(
            record,
            format!("unsupported CAA tag '{other}' (supported: issue, issuewild, iodef)"),
        )),
    }
}

#[cfg(test)]
#[path = "rdata_tests.rs"]
mod rdata_tests;
