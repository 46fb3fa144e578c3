// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! External BIND9 tooling: `named-checkzone` and `rndc`.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::ApplyError;

/// A failed `rndc reload`, as reported by rndc on stderr.
///
/// ```text
/// rndc: 'reload' failed: not found
/// no matching zone 'example.com.' in any view
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rndc {command} failed: {reason}")]
pub struct RndcError {
    /// rndc verb that failed, normally `reload`
    pub command: String,
    /// Short reason from the first line, e.g. `not found`
    pub reason: String,
    /// Zone named in the follow-up lines, when rndc names one
    pub zone: Option<String>,
    /// Remaining lines of the response
    pub details: Option<String>,
}

impl RndcError {
    /// Parse rndc's failure output. Returns `None` for anything that is not an
    /// `rndc: '<command>' failed: <reason>` response.
    #[must_use]
    pub fn parse(response: &str) -> Option<Self> {
        let mut lines = response.trim().lines();
        let summary = lines.next()?.strip_prefix("rndc:")?;
        let (head, reason) = summary.split_once("failed:")?;
        let command = head
            .trim()
            .strip_prefix('\'')?
            .strip_suffix('\'')?
            .to_string();

        let details = lines.collect::<Vec<_>>().join("\n").trim().to_string();
        let zone = details
            .split_once("zone '")
            .and_then(|(_, rest)| rest.split_once('\''))
            .map(|(zone, _)| zone.to_string());

        Some(Self {
            command,
            reason: reason.trim().to_string(),
            zone,
            details: (!details.is_empty()).then_some(details),
        })
    }

    /// Whether the server has no zone by that name in the requested view.
    #[must_use]
    pub fn is_unknown_zone(&self) -> bool {
        self.reason == "not found"
            && self
                .details
                .as_deref()
                .is_some_and(|details| details.contains("no matching zone"))
    }
}

/// Validates a rendered zone file before anything is published.
#[async_trait]
pub trait ZoneChecker: Send + Sync {
    async fn check(&self, origin: &str, zone_file: &Path) -> Result<(), ApplyError>;
}

/// Asks the server to reload a zone from disk.
#[async_trait]
pub trait ZoneReloader: Send + Sync {
    async fn reload(&self, origin: &str) -> Result<(), ApplyError>;
}

/// Runs `named-checkzone <zone> <file>`.
#[derive(Debug, Clone)]
pub struct NamedCheckzone {
    bin: String,
}

impl NamedCheckzone {
    #[must_use]
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl ZoneChecker for NamedCheckzone {
    async fn check(&self, origin: &str, zone_file: &Path) -> Result<(), ApplyError> {
        let args = vec![origin.to_string(), zone_file.display().to_string()];
        run_command(&self.bin, &args).await?;
        info!("named-checkzone accepted {}", zone_file.display());
        Ok(())
    }
}

/// Runs `rndc -s <server> reload <zone> <view>`.
#[derive(Debug, Clone)]
pub struct RndcReloader {
    bin: String,
    server: String,
    view: String,
}

impl RndcReloader {
    #[must_use]
    pub fn new(bin: impl Into<String>, server: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            server: server.into(),
            view: view.into(),
        }
    }
}

#[async_trait]
impl ZoneReloader for RndcReloader {
    async fn reload(&self, origin: &str) -> Result<(), ApplyError> {
        let args = vec![
            "-s".to_string(),
            self.server.clone(),
            "reload".to_string(),
            origin.to_string(),
            self.view.clone(),
        ];

        match run_command(&self.bin, &args).await {
            Ok(output) => {
                info!("Reloaded zone {} on {}: {}", origin, self.server, output.trim());
                Ok(())
            }
            Err(ApplyError::CommandFailed {
                command,
                status,
                output,
            }) => match RndcError::parse(&output) {
                Some(rndc_error) => {
                    if rndc_error.is_unknown_zone() {
                        warn!(
                            "Zone {} is not configured in view '{}' on {}",
                            origin, self.view, self.server
                        );
                    }
                    Err(ApplyError::Rndc(rndc_error))
                }
                None => Err(ApplyError::CommandFailed {
                    command,
                    status,
                    output,
                }),
            },
            Err(e) => Err(e),
        }
    }
}

/// Run `bin args...` and return its stdout.
///
/// # Errors
///
/// [`ApplyError::CommandSpawn`] if the process cannot start,
/// [`ApplyError::CommandFailed`] if it exits non-zero.
pub async fn run_command(bin: &str, args: &[String]) -> Result<String, ApplyError> {
    let command_line = std::iter::once(bin.to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    info!("Running {}", command_line);

    let output = Command::new(bin)
        .args(args)
        .output()
        .await
        .map_err(|e| ApplyError::CommandSpawn {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    debug!("{} stdout: {}", bin, stdout.trim());

    if !output.status.success() {
        let combined = [stderr.trim(), stdout.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n");
        return Err(ApplyError::CommandFailed {
            command: command_line,
            status: output.status.code().unwrap_or(-1),
            output: combined,
        });
    }

    Ok(stdout)
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod commands_tests;
