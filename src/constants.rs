// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for bindsync.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Standard DNS port for zone transfers and dynamic updates
pub const DNS_PORT: u16 = 53;

/// Default TTL applied to desired records that do not carry one (1 hour)
pub const DEFAULT_RECORD_TTL_SECS: u32 = 3600;

/// TSIG fudge time in seconds (allows for clock skew)
pub const TSIG_FUDGE_TIME_SECS: u64 = 300;

/// Default timeout for AXFR and UPDATE round trips
pub const DEFAULT_DNS_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// SOA Constants
// ============================================================================

/// Default SOA refresh interval (1 hour)
pub const DEFAULT_SOA_REFRESH_SECS: u32 = 3600;

/// Default SOA retry interval (10 minutes)
pub const DEFAULT_SOA_RETRY_SECS: u32 = 600;

/// Default SOA expire time (7 days)
pub const DEFAULT_SOA_EXPIRE_SECS: u32 = 604_800;

/// Default SOA minimum / negative TTL (1 day)
pub const DEFAULT_SOA_MINIMUM_SECS: u32 = 86400;

/// Label prepended to the origin when no primary nameserver is known
pub const DEFAULT_PRIMARY_NS_LABEL: &str = "ns";

/// Label prepended to the origin when no admin mailbox is known
pub const DEFAULT_ADMIN_MAILBOX_LABEL: &str = "hostmaster";

/// Number of whitespace separated tokens in an SOA value
pub const SOA_FIELD_COUNT: usize = 7;

// ============================================================================
// BIND9 Constants
// ============================================================================

/// Default BIND9 server address
pub const DEFAULT_BIND_SERVER: &str = "127.0.0.1";

/// Default BIND9 view passed to `rndc reload`
pub const DEFAULT_BIND_VIEW: &str = "default";

/// Default `named-checkzone` executable
pub const DEFAULT_NAMED_CHECKZONE_BIN: &str = "named-checkzone";

/// Default `rndc` executable
pub const DEFAULT_RNDC_BIN: &str = "rndc";

/// Default directory for rendered zone files
pub const DEFAULT_ZONE_OUTPUT_DIR: &str = "zones";

/// File extension of rendered zone files
pub const ZONE_FILE_EXTENSION: &str = "zone";

// ============================================================================
// Git Constants
// ============================================================================

/// Default commit message template; `{zone}` is replaced with the zone name
pub const DEFAULT_GIT_COMMIT_TEMPLATE: &str = "feat(zone): update {zone}";

/// Placeholder substituted in the commit message template
pub const GIT_COMMIT_ZONE_PLACEHOLDER: &str = "{zone}";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 2;

/// Default log level when neither `--log-level`, `LOG_LEVEL` nor `RUST_LOG` is set
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Process exit code for known reconciliation failures
pub const EXIT_CODE_SYNC_ERROR: u8 = 2;

/// Process exit code for unexpected failures
pub const EXIT_CODE_UNEXPECTED: u8 = 3;
