// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bindsync::config::AppConfig;
use bindsync::errors::{ApplyError, FetchError};
use bindsync::prompt::Confirmer;
use bindsync::record::Record;
use bindsync::transfer::ZoneSnapshotProvider;
use bindsync::update::{UpdateOperation, UpdateSender};
use bindsync::zone::ZoneState;
use hickory_client::op::ResponseCode;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const TSIG_KEY_FILE: &str =
    "key \"bindsync-test\" {\n    algorithm hmac-sha256;\n    secret \"dGVzdC1zZWNyZXQ=\";\n};\n";

pub const LIVE_SOA: &str =
    "ns1.example.com. admin.example.com. 2026101700 3600 600 604800 86400";

/// Build a config from the given overrides plus a test TSIG key.
pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
    let mut env: HashMap<String, String> = overrides
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    env.entry("BIND_TSIG_KEYFILE_B64".to_string())
        .or_insert_with(|| BASE64.encode(TSIG_KEY_FILE));
    AppConfig::from_lookup(|key| env.get(key).cloned()).expect("test config should load")
}

/// Config for a live BIND server, or `None` to skip the test.
///
/// Set `BINDSYNC_TEST_SERVER` and `BIND_TSIG_KEYFILE_B64` to run live tests.
pub fn live_config_or_skip() -> Option<AppConfig> {
    if std::env::var("BINDSYNC_TEST_SERVER").is_err() {
        eprintln!("Skipping live test: BINDSYNC_TEST_SERVER is not set");
        return None;
    }
    match AppConfig::from_lookup(|key| match key {
        "BIND_SERVER" => std::env::var("BINDSYNC_TEST_SERVER").ok(),
        _ => std::env::var(key).ok(),
    }) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Skipping live test: {e}");
            None
        }
    }
}

/// Write a desired-state document and return its path.
pub fn write_desired(dir: &Path, name: &str, yaml: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, yaml).expect("write desired state");
    path
}

/// Write an executable shell script that appends its arguments to `log`.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, log: &Path, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\necho \"{name} $*\" >> \"{}\"\nexit {exit_code}\n",
        log.display()
    );
    std::fs::write(&path, script).expect("write fake tool");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake tool");
    path
}

/// The example.com zone as BIND would serve it.
pub fn live_zone() -> ZoneState {
    ZoneState::new("example.com.").with_records(vec![
        Record::new("example.com.", "SOA", 3600, LIVE_SOA),
        Record::new("example.com.", "NS", 3600, "ns1.example.com."),
        Record::new("ns1.example.com.", "A", 3600, "192.0.2.53"),
        Record::new("www.example.com.", "A", 300, "192.0.2.1"),
        Record::new("example.com.", "MX", 3600, "mail.example.com.").with_priority(10),
        Record::new("legacy.example.com.", "CNAME", 300, "www.example.com."),
        Record::new("_acme-challenge.example.com.", "TXT", 60, "\"token\""),
    ])
}

/// Snapshot provider serving a fixed zone.
pub struct StaticSnapshots(pub ZoneState);

#[async_trait]
impl ZoneSnapshotProvider for StaticSnapshots {
    async fn fetch(&self, _zone: &str) -> Result<ZoneState, FetchError> {
        Ok(self.0.clone())
    }
}

/// Update sender that records every batch it is given.
#[derive(Clone, Default)]
pub struct RecordingSender {
    pub batches: Arc<Mutex<Vec<Vec<UpdateOperation>>>>,
}

#[async_trait]
impl UpdateSender for RecordingSender {
    async fn send(
        &self,
        _origin: &str,
        operations: &[UpdateOperation],
    ) -> Result<ResponseCode, ApplyError> {
        self.batches.lock().unwrap().push(operations.to_vec());
        Ok(ResponseCode::NoError)
    }
}

/// Confirmer that always answers no.
pub struct Decline;

#[async_trait]
impl Confirmer for Decline {
    async fn confirm(&self, _zone: &str) -> Result<bool, ApplyError> {
        Ok(false)
    }
}
