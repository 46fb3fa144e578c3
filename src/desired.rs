// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state loading.
//!
//! A desired zone is described by a YAML document:
//!
//! ```yaml
//! zone: example.com
//! default_ttl: 3600
//! soa:
//!   admin_email: hostmaster.example.com.
//! ignore:
//!   - "_acme-challenge.*"
//! records:
//!   - name: www
//!     type: A
//!     value: 192.0.2.10
//!   - name: "@"
//!     type: MX
//!     priority: 10
//!     value: mail
//! ```
//!
//! Before parsing, `{{ name }}` placeholders are replaced with caller-supplied
//! variables and `{{ env.NAME }}` placeholders with values from the
//! environment lookup. The parsed document is validated and normalised into a
//! [`ZoneState`] whose owners and hostname values are fully qualified.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::errors::ValidationError;
use crate::record::{ensure_absolute, expand_owner, Record};
use crate::soa::SoaOverrides;
use crate::zone::ZoneState;

/// Record types whose value is a single hostname, expanded against the origin.
const FQDN_VALUE_TYPES: &[&str] = &["CNAME", "MX", "NS", "PTR"];

/// Minimum number of tokens in an SRV value (`weight port target`).
const SRV_MIN_TOKENS: usize = 3;

/// Top-level YAML document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneSpec {
    /// Zone name; may be supplied by the caller instead
    #[serde(default)]
    pub zone: Option<String>,
    /// Zone-wide default TTL
    #[serde(default)]
    pub default_ttl: Option<u32>,
    /// Desired records
    pub records: Vec<RecordSpec>,
    /// SOA field overrides
    #[serde(default)]
    pub soa: Option<SoaOverrides>,
    /// Glob patterns of live owners to leave untouched
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// One record as written in YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    /// Scalars (numbers, booleans) are accepted and kept as text
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub priority: Option<u16>,
}

/// Normalised desired state ready for planning.
#[derive(Debug, Clone)]
pub struct DesiredZone {
    pub state: ZoneState,
    pub soa_overrides: Option<SoaOverrides>,
    pub ignore: Vec<String>,
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "record value must be a scalar, got {other:?}"
        ))),
    }
}

/// Replace `{{ name }}` and `{{ env.NAME }}` placeholders in `text`.
///
/// Caller variables are consulted first; `env.`-prefixed names go through
/// `env_lookup`.
///
/// # Errors
///
/// Returns [`ValidationError::UnresolvedVariable`] for a placeholder with no
/// value, and [`ValidationError::Schema`] for an unterminated placeholder.
pub fn substitute_variables<F>(
    text: &str,
    vars: &HashMap<String, String>,
    env_lookup: F,
) -> Result<String, ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| {
            ValidationError::Schema("unterminated '{{' placeholder".to_string())
        })?;

        let key = after[..end].trim();
        let value = match vars.get(key) {
            Some(value) => Some(value.clone()),
            None => key.strip_prefix("env.").and_then(&env_lookup),
        };
        let value = value.ok_or_else(|| ValidationError::UnresolvedVariable(key.to_string()))?;

        output.push_str(&value);
        rest = &after[end + 2..];
    }
    output.push_str(rest);

    Ok(output)
}

/// Parse and normalise an already-substituted YAML document.
///
/// `default_ttl` applies when neither the record nor the document sets a TTL.
///
/// # Errors
///
/// Returns [`ValidationError`] when the YAML is malformed, the zone is not
/// named, or a record is invalid.
pub fn parse_desired_zone(
    yaml: &str,
    default_ttl: u32,
    zone_hint: Option<&str>,
) -> Result<DesiredZone, ValidationError> {
    let spec: ZoneSpec =
        serde_yaml::from_str(yaml).map_err(|e| ValidationError::Schema(e.to_string()))?;

    let origin = ensure_absolute(spec.zone.as_deref().or(zone_hint).unwrap_or_default());
    if origin == "." {
        return Err(ValidationError::MissingZone);
    }

    let zone_ttl = spec.default_ttl.unwrap_or(default_ttl);
    let records = spec
        .records
        .iter()
        .map(|record| normalise_record(record, &origin, zone_ttl))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "Loaded {} desired records for {} (default TTL {})",
        records.len(),
        origin,
        zone_ttl
    );

    Ok(DesiredZone {
        state: ZoneState::new(&origin)
            .with_records(records)
            .with_default_ttl(zone_ttl),
        soa_overrides: spec.soa,
        ignore: spec.ignore,
    })
}

/// Read, substitute and parse the desired-state file at `path`.
///
/// # Errors
///
/// Returns [`ValidationError`] if the file cannot be read or fails validation.
pub async fn load_desired_zone<F>(
    path: &Path,
    default_ttl: u32,
    zone_hint: Option<&str>,
    vars: &HashMap<String, String>,
    env_lookup: F,
) -> Result<DesiredZone, ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ValidationError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let rendered = substitute_variables(&raw, vars, env_lookup)?;
    parse_desired_zone(&rendered, default_ttl, zone_hint)
}

fn normalise_record(
    spec: &RecordSpec,
    origin: &str,
    zone_ttl: u32,
) -> Result<Record, ValidationError> {
    let rtype = spec.rtype.trim().to_ascii_uppercase();
    let invalid = |reason: &str| ValidationError::InvalidRecord {
        name: spec.name.clone(),
        rtype: rtype.clone(),
        reason: reason.to_string(),
    };

    let (priority, value) = split_priority(&rtype, spec.priority, spec.value.trim())
        .map_err(|reason| invalid(&reason))?;

    let value = if FQDN_VALUE_TYPES.contains(&rtype.as_str()) {
        if value.is_empty() {
            return Err(invalid("value must be a hostname"));
        }
        expand_owner(&value, origin)
    } else if rtype == "SRV" {
        let mut parts: Vec<&str> = value.split_whitespace().collect();
        if parts.len() < SRV_MIN_TOKENS {
            return Err(invalid("SRV record value must include weight, port, and target"));
        }
        let target = ensure_absolute(parts.pop().unwrap_or_default());
        let mut joined = parts.join(" ");
        joined.push(' ');
        joined.push_str(&target);
        joined
    } else if rtype == "TXT" {
        quote_txt(&value)
    } else {
        value
    };

    let mut record = Record::new(
        expand_owner(&spec.name, origin),
        rtype,
        spec.ttl.unwrap_or(zone_ttl),
        value,
    );
    record.priority = priority;
    Ok(record)
}

/// Move a leading numeric priority out of an MX/SRV value when none is set.
fn split_priority(
    rtype: &str,
    priority: Option<u16>,
    value: &str,
) -> Result<(Option<u16>, String), String> {
    let embedded_len = match rtype {
        "MX" => 2,
        "SRV" => 4,
        _ => return Ok((priority, value.to_string())),
    };

    let tokens: Vec<&str> = value.split_whitespace().collect();
    if priority.is_some() || tokens.len() != embedded_len {
        return Ok((priority, value.to_string()));
    }

    let embedded = tokens[0]
        .parse::<u16>()
        .map_err(|_| format!("'{}' is not a valid priority", tokens[0]))?;
    Ok((Some(embedded), tokens[1..].join(" ")))
}

/// Quote TXT data the way it appears on the wire in presentation form.
fn quote_txt(value: &str) -> String {
    if value.starts_with('"') {
        return value.to_string();
    }
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
#[path = "desired_tests.rs"]
mod desired_tests;
