// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # bindsync - Declarative BIND9 Zone Reconciliation
//!
//! bindsync keeps an authoritative BIND9 zone in line with a desired-state
//! document kept in version control. It transfers the live zone over AXFR,
//! computes the difference, negotiates the next SOA serial, and publishes
//! the changes either as a rendered zone file reloaded through `rndc` or as
//! a single TSIG-signed RFC 2136 dynamic update.
//!
//! ## Modules
//!
//! - [`record`] - Resource record model and name canonicalisation
//! - [`zone`] - Zone state and ignore patterns
//! - [`diff`] - Desired vs. live comparison
//! - [`soa`] - SOA serial negotiation
//! - [`desired`] - Desired-state YAML loader with variable substitution
//! - [`transfer`] - AXFR snapshot provider
//! - [`update`] - RFC 2136 update operations and sender
//! - [`render`] - Zone file renderer and writer
//! - [`commands`] - `named-checkzone` and `rndc` integration
//! - [`controller`] - Plan/apply orchestration
//! - [`exporter`] - Export of a live zone as a desired-state document
//!
//! ## Example
//!
//! ```rust,no_run
//! use bindsync::config::AppConfig;
//! use bindsync::controller::ZoneController;
//! use std::collections::HashMap;
//! use std::path::Path;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AppConfig::from_env()?;
//! let controller = ZoneController::new(&config);
//!
//! let plan = controller
//!     .plan_file(Path::new("zones/example.com.yaml"), None, &HashMap::new())
//!     .await?;
//! println!("{} changes", plan.diff.total());
//!
//! controller.apply(&plan, true).await?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod constants;
pub mod controller;
pub mod desired;
pub mod diff;
pub mod errors;
pub mod exporter;
pub mod gitops;
pub mod metrics;
pub mod prompt;
pub mod rdata;
pub mod record;
pub mod render;
pub mod soa;
pub mod transfer;
pub mod tsig;
pub mod update;
pub mod zone;
