// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TSIG key parsing and signer construction.
//!
//! Zone transfers and dynamic updates are authenticated with a TSIG key that
//! is supplied as a base64-encoded BIND9 key file:
//!
//! ```text
//! key "transfer-key" {
//!     algorithm hmac-sha256;
//!     secret "base64secret==";
//! };
//! ```

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hickory_client::rr::rdata::tsig::TsigAlgorithm;
use hickory_client::rr::Name;
use hickory_proto::rr::dnssec::tsig::TSigner;
use std::fmt;
use std::str::FromStr;

use crate::constants::TSIG_FUDGE_TIME_SECS;
use crate::errors::ConfigError;

/// HMAC algorithm of a TSIG key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    HmacMd5,
    HmacSha1,
    HmacSha224,
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

impl KeyAlgorithm {
    /// BIND9 spelling of the algorithm.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacMd5 => "hmac-md5",
            Self::HmacSha1 => "hmac-sha1",
            Self::HmacSha224 => "hmac-sha224",
            Self::HmacSha256 => "hmac-sha256",
            Self::HmacSha384 => "hmac-sha384",
            Self::HmacSha512 => "hmac-sha512",
        }
    }

    fn to_hickory(self) -> TsigAlgorithm {
        match self {
            Self::HmacMd5 => TsigAlgorithm::HmacMd5,
            Self::HmacSha1 => TsigAlgorithm::HmacSha1,
            Self::HmacSha224 => TsigAlgorithm::HmacSha224,
            Self::HmacSha256 => TsigAlgorithm::HmacSha256,
            Self::HmacSha384 => TsigAlgorithm::HmacSha384,
            Self::HmacSha512 => TsigAlgorithm::HmacSha512,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // dnspython style names carry a trailing dot ("hmac-sha256.")
        match s.trim().trim_end_matches('.').to_ascii_lowercase().as_str() {
            "hmac-md5" | "hmac-md5.sig-alg.reg.int" => Ok(Self::HmacMd5),
            "hmac-sha1" => Ok(Self::HmacSha1),
            "hmac-sha224" => Ok(Self::HmacSha224),
            "hmac-sha256" => Ok(Self::HmacSha256),
            "hmac-sha384" => Ok(Self::HmacSha384),
            "hmac-sha512" => Ok(Self::HmacSha512),
            _ => Err(ConfigError::TsigKeyFile(format!(
                "Unsupported algorithm '{s}'. Supported algorithms: hmac-md5, hmac-sha1, hmac-sha224, hmac-sha256, hmac-sha384, hmac-sha512"
            ))),
        }
    }
}

/// TSIG credentials used for AXFR and UPDATE.
#[derive(Clone, PartialEq, Eq)]
pub struct TsigKey {
    /// Key name as configured on the server
    pub name: String,
    /// HMAC algorithm
    pub algorithm: KeyAlgorithm,
    /// Base64-encoded secret
    pub secret: String,
}

impl fmt::Debug for TsigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TsigKey")
            .field("name", &self.name)
            .field("algorithm", &self.algorithm)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Individual fields that take precedence over the key file contents.
#[derive(Debug, Clone, Default)]
pub struct TsigKeyOverrides {
    pub name: Option<String>,
    pub algorithm: Option<String>,
    pub secret: Option<String>,
}

/// Decode a base64 BIND9 key file and parse it, applying `overrides`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the payload is empty, is not valid base64/UTF-8,
/// or is missing the key name, algorithm or secret.
pub fn parse_key_file_b64(
    encoded: &str,
    overrides: &TsigKeyOverrides,
) -> Result<TsigKey, ConfigError> {
    if encoded.trim().is_empty() {
        return Err(ConfigError::Missing {
            key: "BIND_TSIG_KEYFILE_B64".to_string(),
        });
    }

    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|e| ConfigError::TsigKeyFile(format!("Failed to decode base64 payload: {e}")))?;
    let content = String::from_utf8(decoded)
        .map_err(|e| ConfigError::TsigKeyFile(format!("Key file is not valid UTF-8: {e}")))?;

    parse_key_file(&content, overrides)
}

/// Parse a BIND9 key file (`key "name" { algorithm ...; secret "..."; };`).
///
/// The name is the quoted string after `key`; `algorithm` and `secret` are
/// only looked up inside the braces that follow it.
///
/// # Errors
///
/// Returns [`ConfigError::TsigKeyFile`] when the key statement is malformed,
/// or when the name, algorithm or secret cannot be found and no override
/// supplies it.
pub fn parse_key_file(
    content: &str,
    overrides: &TsigKeyOverrides,
) -> Result<TsigKey, ConfigError> {
    let (file_name, body) = key_statement(content).ok_or_else(|| {
        ConfigError::TsigKeyFile("Key file does not match expected format".to_string())
    })?;
    let file_algorithm = statement_value(body, "algorithm")
        .map(|value| value.trim_matches('"'))
        .filter(|value| !value.is_empty());
    let file_secret = statement_value(body, "secret")
        .and_then(|value| value.strip_prefix('"'))
        .and_then(|value| value.strip_suffix('"'))
        .filter(|value| !value.is_empty());

    let name = overrides.name.as_deref().unwrap_or(file_name);
    let algorithm = overrides
        .algorithm
        .as_deref()
        .or(file_algorithm)
        .ok_or_else(|| ConfigError::TsigKeyFile("Failed to parse algorithm".to_string()))?;
    let secret = overrides
        .secret
        .as_deref()
        .or(file_secret)
        .ok_or_else(|| ConfigError::TsigKeyFile("Failed to parse secret".to_string()))?;

    Ok(TsigKey {
        name: name.to_string(),
        algorithm: algorithm.parse()?,
        secret: secret.to_string(),
    })
}

/// Find the first `key "<name>" { <body> }` statement and return its name and
/// body text.
fn key_statement(content: &str) -> Option<(&str, &str)> {
    content
        .match_indices("key")
        .find_map(|(start, _)| parse_key_statement(&content[start + "key".len()..]))
}

fn parse_key_statement(rest: &str) -> Option<(&str, &str)> {
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let rest = rest.trim_start().strip_prefix('"')?;
    let (name, rest) = rest.split_once('"')?;
    if name.is_empty() {
        return None;
    }

    let rest = rest.trim_start().strip_prefix('{')?;
    let (body, _) = rest.split_once('}')?;
    Some((name, body))
}

/// Return the argument of the `keyword <value>;` statement in `body`.
fn statement_value<'a>(body: &'a str, keyword: &str) -> Option<&'a str> {
    body.split(';').find_map(|statement| {
        let statement = statement.trim();
        let (word, value) = statement.split_once(char::is_whitespace)?;
        word.eq_ignore_ascii_case(keyword).then_some(value.trim())
    })
}

/// Create a TSIG signer from key data.
///
/// # Errors
///
/// Returns an error if the secret is not valid base64 or the key name is not
/// a valid DNS name.
pub fn create_tsig_signer(key: &TsigKey) -> Result<TSigner> {
    let key_bytes = BASE64
        .decode(&key.secret)
        .context("Failed to decode TSIG key")?;

    let signer = TSigner::new(
        key_bytes,
        key.algorithm.to_hickory(),
        Name::from_str(&key.name).context("Invalid TSIG key name")?,
        u16::try_from(TSIG_FUDGE_TIME_SECS).unwrap_or(300),
    )
    .context("Failed to create TSIG signer")?;

    Ok(signer)
}

#[cfg(test)]
#[path = "tsig_tests.rs"]
mod tsig_tests;
