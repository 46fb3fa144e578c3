// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Export of a live zone in the desired-state document shape.
//!
//! The output of `pull` can be saved and fed straight back into `plan`:
//! owners are relative to the origin, the SOA is moved to the `soa` section
//! and records are sorted by owner, type and value.

use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::errors::ExportError;
use crate::soa::SoaConfig;
use crate::zone::ZoneState;

/// Serialisation format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Yaml,
    Json,
}

/// Zone document as written by `pull`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneExport {
    pub zone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa: Option<SoaConfig>,
    pub records: Vec<RecordExport>,
}

/// One exported record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordExport {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    pub ttl: u32,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

impl ZoneExport {
    /// Build the export document for `state` with its parsed SOA.
    #[must_use]
    pub fn new(state: &ZoneState, soa: Option<SoaConfig>) -> Self {
        let origin = &state.origin;
        let mut records: Vec<RecordExport> = state
            .iter_records()
            .filter(|record| !record.is_soa())
            .map(|record| RecordExport {
                name: record.owner_for_zone(origin),
                rtype: record.canonical_type(),
                ttl: record.ttl,
                value: record.value.trim().to_string(),
                priority: record.priority,
            })
            .collect();
        records.sort_by(|a, b| {
            (&a.name, &a.rtype, &a.value, a.priority).cmp(&(
                &b.name, &b.rtype, &b.value, b.priority,
            ))
        });

        Self {
            zone: origin.clone(),
            default_ttl: state.default_ttl.filter(|ttl| *ttl > 0),
            soa,
            records,
        }
    }

    /// Serialise in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if serialisation fails.
    pub fn render(&self, format: ExportFormat) -> Result<String, ExportError> {
        Ok(match format {
            ExportFormat::Yaml => serde_yaml::to_string(self)?,
            ExportFormat::Json => {
                let mut json = serde_json::to_string_pretty(self)?;
                json.push('\n');
                json
            }
        })
    }
}

/// Write an export to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the file cannot be written.
pub async fn write_export(path: &Path, content: &str) -> Result<(), ExportError> {
    let io_error = |source: std::io::Error| ExportError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    tokio::fs::write(path, content).await.map_err(io_error)?;

    info!("Wrote zone state to {}", path.display());
    Ok(())
}

#[cfg(test)]
#[path = "exporter_tests.rs"]
mod exporter_tests;
