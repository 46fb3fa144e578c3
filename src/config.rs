// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Environment-driven configuration.
//!
//! [`AppConfig`] is built once at process start and passed by reference to
//! everything that needs it. Nothing inside the reconciliation engine reads
//! the environment directly.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BIND_SERVER` | `127.0.0.1` |
//! | `BIND_PORT` | `53` |
//! | `BIND_VIEW` | `default` |
//! | `BIND_TSIG_KEYFILE_B64` | required |
//! | `BIND_TSIG_NAME` / `BIND_TSIG_ALGORITHM` / `BIND_TSIG_SECRET` | from key file |
//! | `ZONE_OUTPUT_DIR` | `zones` |
//! | `NAMED_CHECKZONE_BIN` | `named-checkzone` (empty disables validation) |
//! | `RNDC_BIN` | `rndc` |
//! | `RNDC_SERVER` | `BIND_SERVER` |
//! | `SERIAL_STRATEGY` | `date` |
//! | `DEFAULT_RECORD_TTL` | `3600` |
//! | `GIT_AUTO_COMMIT` | `false` |
//! | `GIT_COMMIT_TEMPLATE` | `feat(zone): update {zone}` |
//! | `LOG_LEVEL` | `info` |
//! | `AXFR_TIMEOUT` | `10` (seconds, fractional allowed) |
//! | `APPLY_STRATEGY` | `dynamic` |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BIND_SERVER, DEFAULT_BIND_VIEW, DEFAULT_DNS_TIMEOUT_SECS, DEFAULT_GIT_COMMIT_TEMPLATE,
    DEFAULT_LOG_LEVEL, DEFAULT_NAMED_CHECKZONE_BIN, DEFAULT_RECORD_TTL_SECS, DEFAULT_RNDC_BIN,
    DEFAULT_ZONE_OUTPUT_DIR, DNS_PORT, GIT_COMMIT_ZONE_PLACEHOLDER,
};
use crate::errors::ConfigError;
use crate::soa::SerialStrategy;
use crate::tsig::{parse_key_file_b64, TsigKey, TsigKeyOverrides};

/// How an apply reaches the live zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyStrategy {
    /// RFC 2136 UPDATE built from the diff
    #[default]
    Dynamic,
    /// Write the zone file and `rndc reload`
    Zone,
}

impl ApplyStrategy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dynamic => "dynamic",
            Self::Zone => "zone",
        }
    }
}

impl fmt::Display for ApplyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dynamic" => Ok(Self::Dynamic),
            "zone" => Ok(Self::Zone),
            _ => Err("must be either 'dynamic' or 'zone'".to_string()),
        }
    }
}

/// Application-wide configuration values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_server: String,
    pub bind_port: u16,
    pub bind_view: String,
    pub tsig: TsigKey,
    /// Directory receiving `<zone>.zone` files
    pub zone_output_dir: PathBuf,
    /// `None` disables validation
    pub named_checkzone_bin: Option<String>,
    /// `None` makes the zone strategy fail at reload time
    pub rndc_bin: Option<String>,
    pub rndc_server: String,
    pub serial_strategy: SerialStrategy,
    /// TTL for desired records that carry none and whose zone has no default
    pub default_record_ttl: u32,
    pub git_auto_commit: bool,
    pub git_commit_template: String,
    pub log_level: String,
    /// Bound on each AXFR and UPDATE round trip
    pub dns_timeout: Duration,
    pub apply_strategy: ApplyStrategy,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required setting is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required setting is missing or a value
    /// cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let bind_server = get("BIND_SERVER", DEFAULT_BIND_SERVER);
        let bind_port = parse_value("BIND_PORT", &get("BIND_PORT", &DNS_PORT.to_string()))?;
        let bind_view = get("BIND_VIEW", DEFAULT_BIND_VIEW);

        let tsig = parse_key_file_b64(
            &lookup("BIND_TSIG_KEYFILE_B64").unwrap_or_default(),
            &TsigKeyOverrides {
                name: non_empty(lookup("BIND_TSIG_NAME")),
                algorithm: non_empty(lookup("BIND_TSIG_ALGORITHM")),
                secret: non_empty(lookup("BIND_TSIG_SECRET")),
            },
        )?;

        let apply_strategy_raw = get("APPLY_STRATEGY", ApplyStrategy::Dynamic.as_str());
        let apply_strategy =
            apply_strategy_raw
                .parse()
                .map_err(|reason| ConfigError::Invalid {
                    key: "APPLY_STRATEGY".to_string(),
                    value: apply_strategy_raw.clone(),
                    reason,
                })?;

        let serial_strategy_raw = get("SERIAL_STRATEGY", SerialStrategy::Date.as_str());
        let serial_strategy =
            serial_strategy_raw
                .parse()
                .map_err(|reason| ConfigError::Invalid {
                    key: "SERIAL_STRATEGY".to_string(),
                    value: serial_strategy_raw.clone(),
                    reason,
                })?;

        let timeout_raw = get("AXFR_TIMEOUT", &DEFAULT_DNS_TIMEOUT_SECS.to_string());
        let timeout_secs: f64 = parse_value("AXFR_TIMEOUT", &timeout_raw)?;
        let dns_timeout = Duration::try_from_secs_f64(timeout_secs)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .ok_or_else(|| ConfigError::Invalid {
                key: "AXFR_TIMEOUT".to_string(),
                value: timeout_raw.clone(),
                reason: "must be a positive number of seconds".to_string(),
            })?;

        Ok(Self {
            rndc_server: non_empty(lookup("RNDC_SERVER")).unwrap_or_else(|| bind_server.clone()),
            bind_server,
            bind_port,
            bind_view,
            tsig,
            zone_output_dir: PathBuf::from(get("ZONE_OUTPUT_DIR", DEFAULT_ZONE_OUTPUT_DIR)),
            named_checkzone_bin: non_empty(Some(get(
                "NAMED_CHECKZONE_BIN",
                DEFAULT_NAMED_CHECKZONE_BIN,
            ))),
            rndc_bin: non_empty(Some(get("RNDC_BIN", DEFAULT_RNDC_BIN))),
            serial_strategy,
            default_record_ttl: parse_value(
                "DEFAULT_RECORD_TTL",
                &get("DEFAULT_RECORD_TTL", &DEFAULT_RECORD_TTL_SECS.to_string()),
            )?,
            git_auto_commit: parse_bool(lookup("GIT_AUTO_COMMIT").as_deref(), false),
            git_commit_template: get("GIT_COMMIT_TEMPLATE", DEFAULT_GIT_COMMIT_TEMPLATE),
            log_level: get("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            dns_timeout,
            apply_strategy,
        })
    }

    /// Address of the authoritative server as `host:port`.
    #[must_use]
    pub fn server_address(&self) -> String {
        if self.bind_server.contains(':') && !self.bind_server.starts_with('[') {
            format!("[{}]:{}", self.bind_server, self.bind_port)
        } else {
            format!("{}:{}", self.bind_server, self.bind_port)
        }
    }

    /// Commit message for a change to `zone` (trailing dot stripped).
    #[must_use]
    pub fn commit_message(&self, zone: &str) -> String {
        self.git_commit_template
            .replace(GIT_COMMIT_ZONE_PLACEHOLDER, zone.trim_end_matches('.'))
    }
}

/// Return a boolean parsed from a string (`1`, `true`, `yes`, `y`, `on`).
#[must_use]
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        None => default,
        Some(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "y" | "on"
        ),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
