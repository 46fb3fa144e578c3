// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone file rendering and artifact writing.
//!
//! The renderer produces BIND9 master-file text deterministically from an
//! origin, a default TTL, a resolved SOA and the desired records. The zone
//! file strategy reloads it with `rndc`; the dynamic strategy still writes it
//! as an audit artifact and for `named-checkzone`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::ZONE_FILE_EXTENSION;
use crate::errors::ApplyError;
use crate::record::Record;
use crate::soa::SoaConfig;

/// Rendered zone text and its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub text: String,
    pub output_path: PathBuf,
}

/// Return `<output_dir>/<origin without trailing dot>.zone`.
#[must_use]
pub fn zone_file_path(output_dir: &Path, origin: &str) -> PathBuf {
    let safe_origin = origin.trim().trim_end_matches('.');
    output_dir.join(format!("{safe_origin}.{ZONE_FILE_EXTENSION}"))
}

/// Renders BIND9 master files into a fixed output directory.
#[derive(Debug, Clone)]
pub struct ZoneFileRenderer {
    output_dir: PathBuf,
}

impl ZoneFileRenderer {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Render the zone.
    ///
    /// SOA records in `records` are skipped; `soa` is rendered instead.
    /// Owners are written relative to `origin`.
    #[must_use]
    pub fn render(
        &self,
        origin: &str,
        default_ttl: u32,
        soa: &SoaConfig,
        records: &[Record],
    ) -> RenderResult {
        let mut text = format!(
            "$ORIGIN {origin}\n\
             $TTL {default_ttl}\n\
             @ IN SOA {} {} (\n\
             \x20   {} ; serial\n\
             \x20   {} ; refresh\n\
             \x20   {} ; retry\n\
             \x20   {} ; expire\n\
             \x20   {} ; minimum\n\
             )\n",
            soa.primary_ns,
            soa.admin_email,
            soa.serial,
            soa.refresh,
            soa.retry,
            soa.expire,
            soa.minimum
        );

        let mut rendered = 0usize;
        for record in records.iter().filter(|record| !record.is_soa()) {
            text.push_str(&format!(
                "{} {} IN {} {}\n",
                record.owner_for_zone(origin),
                record.ttl,
                record.canonical_type(),
                record.presentation_value()
            ));
            rendered += 1;
        }

        debug!("Rendered {} records for zone {}", rendered, origin);

        RenderResult {
            text,
            output_path: zone_file_path(&self.output_dir, origin),
        }
    }
}

/// Persists rendered zone artifacts.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    /// Write `artifact.text` to `artifact.output_path`.
    async fn write(&self, artifact: &RenderResult) -> Result<(), ApplyError>;
}

/// Writes artifacts to the local filesystem, creating parent directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileArtifactWriter;

#[async_trait]
impl ArtifactWriter for FileArtifactWriter {
    async fn write(&self, artifact: &RenderResult) -> Result<(), ApplyError> {
        let path = &artifact.output_path;
        let write_failed = |e: std::io::Error| ApplyError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(write_failed)?;
        }
        tokio::fs::write(path, artifact.text.as_bytes())
            .await
            .map_err(write_failed)?;

        info!("Wrote zone file {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod render_tests;
