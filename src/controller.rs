// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Plan/apply orchestration.
//!
//! [`ZoneController`] sequences one reconciliation of one zone:
//!
//! ```text
//! plan:  desired ─┐
//!                 ├─► ignore filter ─► diff ─► SOA ─► render ─► PlanResult
//!        AXFR ────┘
//!
//! apply: no changes? ─► confirm ─► write ─► named-checkzone ─┬─► rndc reload   (zone)
//!                                                            └─► UPDATE batch  (dynamic)
//!                                                                  └─► git commit (optional)
//! ```
//!
//! Every step runs strictly after the previous one. Any failure stops the
//! apply; there are no retries and no rollback. A plan that finds no changes
//! makes apply a no-op without side effects.

use chrono::{DateTime, Utc};
use hickory_client::op::ResponseCode;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::commands::{NamedCheckzone, RndcReloader, ZoneChecker, ZoneReloader};
use crate::config::{AppConfig, ApplyStrategy};
use crate::desired::{load_desired_zone, DesiredZone};
use crate::diff::{diff_zones, ZoneDiff};
use crate::errors::{ApplyError, SyncError};
use crate::gitops::{Committer, GitCommitter};
use crate::metrics;
use crate::prompt::{Confirmer, StdinConfirmer};
use crate::render::{ArtifactWriter, FileArtifactWriter, RenderResult, ZoneFileRenderer};
use crate::soa::{SoaConfig, SoaNegotiator};
use crate::transfer::{AxfrSnapshotProvider, ZoneSnapshotProvider};
use crate::update::{build_update_operations, validate_operations, DnsUpdateSender, UpdateSender};
use crate::zone::{IgnoreFilter, ZoneState};

/// Everything computed by a plan and needed by an apply.
#[derive(Debug, Clone)]
pub struct PlanResult {
    /// Normalised desired zone
    pub desired: ZoneState,
    /// Live zone as transferred, before ignore filtering
    pub current: ZoneState,
    pub diff: ZoneDiff,
    /// SOA to publish
    pub soa: SoaConfig,
    /// Rendered zone file
    pub render: RenderResult,
    /// SHA-256 of the diff and serial, for correlating plan output with an apply
    pub fingerprint: String,
}

/// Result of an apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The plan had no changes; nothing was touched
    Unchanged,
    /// The operator declined; nothing was touched
    Aborted,
    /// Changes were published
    Applied {
        strategy: ApplyStrategy,
        /// Update operations sent (dynamic) or change entries reloaded (zone)
        changes: usize,
    },
}

impl ApplyOutcome {
    fn metric_label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Aborted => "aborted",
            Self::Applied { .. } => "applied",
        }
    }
}

#[derive(Serialize)]
struct Fingerprint<'a> {
    origin: &'a str,
    diff: &'a ZoneDiff,
    serial: u32,
}

/// Return the SHA-256 hex digest identifying a plan's changes.
#[must_use]
pub fn calculate_plan_fingerprint(origin: &str, diff: &ZoneDiff, serial: u32) -> String {
    let json = serde_json::to_string(&Fingerprint {
        origin,
        diff,
        serial,
    })
    .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Coordinates plan and apply for one zone.
pub struct ZoneController<'a> {
    config: &'a AppConfig,
    snapshots: Box<dyn ZoneSnapshotProvider>,
    renderer: ZoneFileRenderer,
    writer: Box<dyn ArtifactWriter>,
    checker: Option<Box<dyn ZoneChecker>>,
    reloader: Option<Box<dyn ZoneReloader>>,
    updates: Box<dyn UpdateSender>,
    confirmer: Box<dyn Confirmer>,
    committer: Option<Box<dyn Committer>>,
    negotiator: SoaNegotiator,
    now: Option<DateTime<Utc>>,
}

impl<'a> ZoneController<'a> {
    /// Build a controller wired to the real server, tools and terminal.
    #[must_use]
    pub fn new(config: &'a AppConfig) -> Self {
        let server = config.server_address();
        Self {
            config,
            snapshots: Box::new(AxfrSnapshotProvider::new(
                server.clone(),
                config.tsig.clone(),
                config.dns_timeout,
            )),
            renderer: ZoneFileRenderer::new(&config.zone_output_dir),
            writer: Box::new(FileArtifactWriter),
            checker: config
                .named_checkzone_bin
                .as_ref()
                .map(|bin| Box::new(NamedCheckzone::new(bin)) as Box<dyn ZoneChecker>),
            reloader: config.rndc_bin.as_ref().map(|bin| {
                Box::new(RndcReloader::new(
                    bin,
                    &config.rndc_server,
                    &config.bind_view,
                )) as Box<dyn ZoneReloader>
            }),
            updates: Box::new(DnsUpdateSender::new(
                server,
                config.tsig.clone(),
                config.dns_timeout,
            )),
            confirmer: Box::new(StdinConfirmer),
            committer: config
                .git_auto_commit
                .then(|| Box::new(GitCommitter::default()) as Box<dyn Committer>),
            negotiator: SoaNegotiator::new(config.serial_strategy),
            now: None,
        }
    }

    #[must_use]
    pub fn with_snapshot_provider(mut self, provider: Box<dyn ZoneSnapshotProvider>) -> Self {
        self.snapshots = provider;
        self
    }

    #[must_use]
    pub fn with_artifact_writer(mut self, writer: Box<dyn ArtifactWriter>) -> Self {
        self.writer = writer;
        self
    }

    #[must_use]
    pub fn with_checker(mut self, checker: Option<Box<dyn ZoneChecker>>) -> Self {
        self.checker = checker;
        self
    }

    #[must_use]
    pub fn with_reloader(mut self, reloader: Option<Box<dyn ZoneReloader>>) -> Self {
        self.reloader = reloader;
        self
    }

    #[must_use]
    pub fn with_update_sender(mut self, sender: Box<dyn UpdateSender>) -> Self {
        self.updates = sender;
        self
    }

    #[must_use]
    pub fn with_confirmer(mut self, confirmer: Box<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    #[must_use]
    pub fn with_committer(mut self, committer: Option<Box<dyn Committer>>) -> Self {
        self.committer = committer;
        self
    }

    /// Pin the clock used for serial generation.
    #[must_use]
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Load the desired-state file and plan it.
    ///
    /// `{{ env.NAME }}` placeholders resolve against the process environment.
    ///
    /// # Errors
    ///
    /// See [`ZoneController::plan`]; loading adds [`SyncError::Validation`].
    pub async fn plan_file(
        &self,
        path: &Path,
        zone_hint: Option<&str>,
        vars: &HashMap<String, String>,
    ) -> Result<PlanResult, SyncError> {
        let desired = load_desired_zone(
            path,
            self.config.default_record_ttl,
            zone_hint,
            vars,
            |key| std::env::var(key).ok(),
        )
        .await?;
        self.plan(desired).await
    }

    /// Compute the changes needed to reach `desired`. Read-only.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if an ignore pattern is invalid, the transfer
    /// fails, or the live SOA cannot be parsed.
    pub async fn plan(&self, desired: DesiredZone) -> Result<PlanResult, SyncError> {
        let origin = desired.state.origin.clone();
        let filter = IgnoreFilter::new(&desired.ignore)?;

        let current = self.snapshots.fetch(&origin).await?;
        let filtered = current.without_ignored(&filter);
        let diff = diff_zones(&desired.state, &filtered);

        let soa = self.negotiator.negotiate_at(
            &origin,
            desired.soa_overrides.as_ref(),
            current.find_soa(),
            self.now.unwrap_or_else(Utc::now),
        )?;

        let default_ttl = desired
            .state
            .default_ttl
            .unwrap_or(self.config.default_record_ttl);
        let render = self
            .renderer
            .render(&origin, default_ttl, &soa, &desired.state.records);
        let fingerprint = calculate_plan_fingerprint(&origin, &diff, soa.serial);

        metrics::record_plan(&origin, diff.total());
        metrics::record_changes(diff.added.len(), diff.removed.len(), diff.ttl_changed.len());
        info!(
            "Plan for {}: {} added, {} removed, {} TTL changes (serial {}, fingerprint {})",
            origin,
            diff.added.len(),
            diff.removed.len(),
            diff.ttl_changed.len(),
            soa.serial,
            &fingerprint[..12]
        );

        Ok(PlanResult {
            desired: desired.state,
            current,
            diff,
            soa,
            render,
            fingerprint,
        })
    }

    /// Publish a plan.
    ///
    /// Unless `assume_yes` is set, the confirmer is asked first.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] for the first failing step. Git commit failures
    /// are logged and do not fail the apply.
    pub async fn apply(
        &self,
        plan: &PlanResult,
        assume_yes: bool,
    ) -> Result<ApplyOutcome, SyncError> {
        let started = Instant::now();
        let strategy = self.config.apply_strategy;

        let result = self.apply_inner(plan, assume_yes, strategy).await;
        match &result {
            Ok(outcome) => {
                metrics::record_apply(strategy.as_str(), outcome.metric_label(), started.elapsed());
            }
            Err(e) => {
                metrics::record_apply(strategy.as_str(), "error", started.elapsed());
                metrics::record_error(e.reason());
            }
        }
        result
    }

    async fn apply_inner(
        &self,
        plan: &PlanResult,
        assume_yes: bool,
        strategy: ApplyStrategy,
    ) -> Result<ApplyOutcome, SyncError> {
        let origin = plan.desired.origin.as_str();

        if !plan.diff.has_changes() {
            info!("No changes detected for {}; nothing to apply", origin);
            return Ok(ApplyOutcome::Unchanged);
        }

        if !assume_yes && !self.confirmer.confirm(origin).await? {
            info!("Apply aborted by user for {}", origin);
            return Ok(ApplyOutcome::Aborted);
        }

        // Reject what cannot be published before anything is written
        let operations = match strategy {
            ApplyStrategy::Dynamic => {
                let operations = build_update_operations(&plan.diff);
                validate_operations(&operations)?;
                operations
            }
            ApplyStrategy::Zone => {
                if self.reloader.is_none() {
                    return Err(ApplyError::ReloaderNotConfigured {
                        zone: origin.to_string(),
                    }
                    .into());
                }
                Vec::new()
            }
        };

        self.writer.write(&plan.render).await?;

        match &self.checker {
            Some(checker) => checker.check(origin, &plan.render.output_path).await?,
            None => debug!("Skipping named-checkzone validation (no binary configured)"),
        }

        let changes = match (strategy, &self.reloader) {
            (ApplyStrategy::Zone, Some(reloader)) => {
                reloader.reload(origin).await?;
                plan.diff.total()
            }
            (ApplyStrategy::Zone, None) => {
                return Err(ApplyError::ReloaderNotConfigured {
                    zone: origin.to_string(),
                }
                .into())
            }
            (ApplyStrategy::Dynamic, _) => {
                info!(
                    "Sending dynamic update for {}: {} additions, {} removals, {} TTL changes",
                    origin,
                    plan.diff.added.len(),
                    plan.diff.removed.len(),
                    plan.diff.ttl_changed.len()
                );
                let code = self.updates.send(origin, &operations).await?;
                if code != ResponseCode::NoError {
                    return Err(ApplyError::UpdateRejected {
                        zone: origin.to_string(),
                        rcode: code.to_string(),
                    }
                    .into());
                }
                for operation in &operations {
                    metrics::record_update_operation(operation.action());
                }
                operations.len()
            }
        };

        if let Some(committer) = &self.committer {
            let message = self.config.commit_message(origin);
            if let Err(e) = committer
                .commit(std::slice::from_ref(&plan.render.output_path), &message)
                .await
            {
                warn!("Git auto-commit failed for {}: {}", origin, e);
            }
        }

        info!("Apply complete for {} ({} strategy)", origin, strategy);
        Ok(ApplyOutcome::Applied { strategy, changes })
    }

    /// Fetch the live zone and its parsed SOA.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the transfer fails or the SOA is malformed.
    pub async fn pull(&self, zone: &str) -> Result<(ZoneState, Option<SoaConfig>), SyncError> {
        let state = self.snapshots.fetch(zone).await?;
        let soa = state
            .find_soa()
            .map(|record| SoaConfig::parse(&record.value))
            .transpose()?;
        Ok((state, soa))
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
