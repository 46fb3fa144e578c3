// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for zone reconciliation.
//!
//! This module provides specialized error types for:
//! - Zone transfers from the authoritative server ([`FetchError`])
//! - Desired-state input that fails validation ([`ValidationError`])
//! - Live SOA records that cannot be parsed ([`MalformedSoaError`])
//! - External commands and dynamic updates that fail during apply ([`ApplyError`])
//! - Missing or invalid settings ([`ConfigError`])
//! - Pulled zones that cannot be exported ([`ExportError`])
//!
//! Every failure is surfaced to the caller as one of these types, aggregated in
//! [`SyncError`]. Nothing here is retried automatically.

use thiserror::Error;

use crate::commands::RndcError;

/// Errors that can occur while fetching the live zone snapshot (AXFR).
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// Zone transfer failed (network, TSIG, malformed transfer)
    #[error("Zone transfer for '{zone}' from {server} failed: {reason}")]
    TransferFailed {
        /// The zone being transferred
        zone: String,
        /// The authoritative server (host:port)
        server: String,
        /// Reason for the transfer failure
        reason: String,
    },

    /// The server answered the transfer with a non-success response code
    #[error("Zone transfer for '{zone}' refused by {server} with response code {rcode}")]
    TransferRefused {
        /// The zone being transferred
        zone: String,
        /// The server that refused
        server: String,
        /// Response code returned by the server
        rcode: String,
    },

    /// Zone transfer did not complete within the configured timeout
    #[error("Zone transfer for '{zone}' from {server} timed out after {timeout_secs}s")]
    TransferTimeout {
        /// The zone being transferred
        zone: String,
        /// The authoritative server
        server: String,
        /// Timeout in seconds
        timeout_secs: u64,
    },

    /// A live snapshot must carry exactly one SOA record
    #[error("Zone transfer for '{zone}' from {server} returned no SOA record")]
    MissingSoa {
        /// The zone being transferred
        zone: String,
        /// The authoritative server
        server: String,
    },
}

/// Errors raised while loading and validating desired state.
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    /// The desired-state file could not be read
    #[error("Failed to read desired state '{path}': {reason}")]
    Unreadable {
        /// Path of the desired-state document
        path: String,
        /// Underlying I/O error
        reason: String,
    },

    /// The document is not valid YAML or does not match the schema
    #[error("YAML validation error: {0}")]
    Schema(String),

    /// A `{{ name }}` placeholder had no value
    #[error("Unresolved template variable '{0}'")]
    UnresolvedVariable(String),

    /// Neither the document nor the caller named the zone
    #[error("Zone name is required via YAML 'zone' or --zone flag")]
    MissingZone,

    /// Record data is malformed (e.g. an SRV value with fewer than 3 tokens)
    #[error("Invalid record data for '{name}' ({rtype}): {reason}")]
    InvalidRecord {
        /// Owner name of the offending record
        name: String,
        /// RR type of the offending record
        rtype: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// An ignore pattern is not a valid glob
    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidIgnorePattern {
        /// The offending pattern
        pattern: String,
        /// Explanation from the glob parser
        reason: String,
    },
}

/// The live SOA value did not have the seven expected fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("SOA record is malformed: {reason} (value: '{value}')")]
pub struct MalformedSoaError {
    /// The raw SOA value
    pub value: String,
    /// Explanation of what is malformed
    pub reason: String,
}

/// Errors raised while applying a plan.
#[derive(Error, Debug, Clone)]
pub enum ApplyError {
    /// The rendered zone file could not be written
    #[error("Failed to write zone file {path}: {reason}")]
    WriteFailed {
        /// Destination path
        path: String,
        /// Underlying I/O error
        reason: String,
    },

    /// An external command could not be started
    #[error("Failed to run '{command}': {reason}")]
    CommandSpawn {
        /// The command line
        command: String,
        /// Reason the process could not start
        reason: String,
    },

    /// An external command exited with a non-zero status
    #[error("Command '{command}' exited with status {status}: {output}")]
    CommandFailed {
        /// The command line
        command: String,
        /// Exit status (or -1 when terminated by a signal)
        status: i32,
        /// Combined stderr/stdout of the process
        output: String,
    },

    /// `rndc` reported a structured failure
    #[error(transparent)]
    Rndc(#[from] RndcError),

    /// The zone-file strategy needs `rndc` but none is configured
    #[error("RNDC binary not configured; cannot reload zone '{zone}' with the zone apply strategy")]
    ReloaderNotConfigured {
        /// Zone that needed a reload
        zone: String,
    },

    /// A record could not be expressed as a dynamic update
    #[error("Cannot build dynamic update for zone '{zone}': {reason}")]
    InvalidUpdate {
        /// The zone being updated
        zone: String,
        /// Explanation of what could not be converted
        reason: String,
    },

    /// The update could not be delivered
    #[error("Dynamic update for zone '{zone}' to {server} failed: {reason}")]
    UpdateFailed {
        /// The zone being updated
        zone: String,
        /// The DNS server the update was sent to
        server: String,
        /// Specific reason for the failure
        reason: String,
    },

    /// The server answered the update with a non-success response code
    #[error("Dynamic update for zone '{zone}' failed with rcode {rcode}")]
    UpdateRejected {
        /// The zone being updated
        zone: String,
        /// Response code returned by the server
        rcode: String,
    },

    /// The confirmation prompt could not be read
    #[error("Failed to read confirmation: {0}")]
    Prompt(String),

    /// Git auto-commit failed
    #[error("Git command 'git {args}' failed: {reason}")]
    Git {
        /// Arguments passed to git
        args: String,
        /// Output or spawn error
        reason: String,
    },
}

/// Errors raised while building configuration.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// A required setting is absent
    #[error("{key} is required")]
    Missing {
        /// Environment variable name
        key: String,
    },

    /// A setting has an unusable value
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        /// Environment variable name
        key: String,
        /// The rejected value
        value: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// The TSIG key file could not be decoded or parsed
    #[error("Invalid TSIG key file: {0}")]
    TsigKeyFile(String),
}

/// Errors raised while exporting a pulled zone.
#[derive(Error, Debug)]
pub enum ExportError {
    /// YAML serialisation failed
    #[error("Failed to serialise zone as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialisation failed
    #[error("Failed to serialise zone as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The export could not be written
    #[error("Failed to write export {path}: {source}")]
    Io {
        /// Destination path
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Composite error type returned by the reconciliation engine.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// Snapshot retrieval failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Desired state is malformed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The live SOA could not be parsed
    #[error(transparent)]
    MalformedSoa(#[from] MalformedSoaError),

    /// An apply step failed
    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// Settings are missing or invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SyncError {
    /// Short, stable reason code for this error.
    ///
    /// Used as the `reason` label on error metrics and in structured log fields.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Fetch(FetchError::TransferFailed { .. }) => "ZoneTransferFailed",
            Self::Fetch(FetchError::TransferRefused { .. }) => "ZoneTransferRefused",
            Self::Fetch(FetchError::TransferTimeout { .. }) => "ZoneTransferTimeout",
            Self::Fetch(FetchError::MissingSoa { .. }) => "ZoneTransferMissingSoa",

            Self::Validation(_) => "ValidationFailed",
            Self::MalformedSoa(_) => "MalformedSoa",

            Self::Apply(ApplyError::WriteFailed { .. }) => "ZoneFileWriteFailed",
            Self::Apply(
                ApplyError::CommandSpawn { .. }
                | ApplyError::CommandFailed { .. }
                | ApplyError::Rndc(_),
            ) => "CommandFailed",
            Self::Apply(ApplyError::ReloaderNotConfigured { .. }) => "ReloaderNotConfigured",
            Self::Apply(ApplyError::InvalidUpdate { .. }) => "InvalidUpdate",
            Self::Apply(ApplyError::UpdateFailed { .. }) => "UpdateFailed",
            Self::Apply(ApplyError::UpdateRejected { .. }) => "UpdateRejected",
            Self::Apply(ApplyError::Prompt(_)) => "PromptFailed",
            Self::Apply(ApplyError::Git { .. }) => "GitFailed",

            Self::Config(_) => "ConfigInvalid",
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
