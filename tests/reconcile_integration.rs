// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Integration tests for plan/apply/pull through the public API.
//!
//! The DNS server is replaced by in-memory collaborators; `named-checkzone`
//! and `rndc` are replaced by shell scripts that log their arguments. Tests
//! against a real BIND server are ignored by default.
//!
//! Run the live tests with: cargo test --test reconcile_integration -- --ignored

mod common;

use bindsync::config::ApplyStrategy;
use bindsync::controller::{ApplyOutcome, ZoneController};
use bindsync::exporter::{ExportFormat, ZoneExport};
use bindsync::update::to_nsupdate_script;
use chrono::{TimeZone, Utc};
use common::{live_zone, test_config, write_desired, Decline, RecordingSender, StaticSnapshots};
use std::collections::HashMap;

const DESIRED: &str = r#"
zone: example.com
default_ttl: 3600
ignore:
  - "_acme-challenge.*"
records:
  - {name: "@", type: NS, value: ns1}
  - {name: ns1, type: A, value: 192.0.2.53}
  - {name: www, type: A, ttl: 300, value: "{{ www_ip }}"}
  - {name: "@", type: MX, priority: 10, value: mail}
  - {name: api, type: A, ttl: 300, value: 192.0.2.10}
"#;

fn vars() -> HashMap<String, String> {
    HashMap::from([("www_ip".to_string(), "192.0.2.1".to_string())])
}

#[tokio::test]
async fn test_plan_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let desired = write_desired(dir.path(), "example.com.yaml", DESIRED);
    let config = test_config(&[]);
    let controller = ZoneController::new(&config)
        .with_snapshot_provider(Box::new(StaticSnapshots(live_zone())))
        .with_clock(Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap());

    let plan = controller.plan_file(&desired, None, &vars()).await.unwrap();

    let added: Vec<_> = plan.diff.added.iter().map(|r| r.name.as_str()).collect();
    let removed: Vec<_> = plan.diff.removed.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(added, vec!["api.example.com."]);
    assert_eq!(removed, vec!["legacy.example.com."]);
    assert!(plan.diff.ttl_changed.is_empty());
    assert_eq!(plan.soa.serial, 2_026_101_701);
}

#[tokio::test]
async fn test_apply_dynamic_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let desired = write_desired(dir.path(), "example.com.yaml", DESIRED);
    let output = dir.path().join("zones");
    let config = test_config(&[
        ("ZONE_OUTPUT_DIR", output.to_str().unwrap()),
        ("NAMED_CHECKZONE_BIN", ""),
        ("APPLY_STRATEGY", "dynamic"),
    ]);
    let sender = RecordingSender::default();
    let controller = ZoneController::new(&config)
        .with_snapshot_provider(Box::new(StaticSnapshots(live_zone())))
        .with_update_sender(Box::new(sender.clone()));

    let plan = controller.plan_file(&desired, None, &vars()).await.unwrap();
    let outcome = controller.apply(&plan, true).await.unwrap();

    assert_eq!(
        outcome,
        ApplyOutcome::Applied {
            strategy: ApplyStrategy::Dynamic,
            changes: 2
        }
    );

    let batches = sender.batches.lock().unwrap();
    assert_eq!(batches.len(), 1, "all changes go in one UPDATE message");
    assert_eq!(
        to_nsupdate_script("example.com.", &batches[0]),
        "zone example.com.\n\
         update delete legacy.example.com. CNAME www.example.com.\n\
         update add api.example.com. 300 A 192.0.2.10\n\
         send\n"
    );

    // The rendered file is kept as an artifact for the dynamic strategy too
    assert!(output.join("example.com.zone").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_apply_zone_strategy_runs_tools() {
    let dir = tempfile::tempdir().unwrap();
    let desired = write_desired(dir.path(), "example.com.yaml", DESIRED);
    let output = dir.path().join("zones");
    let log = dir.path().join("tools.log");
    let checkzone = common::fake_tool(dir.path(), "named-checkzone", &log, 0);
    let rndc = common::fake_tool(dir.path(), "rndc", &log, 0);
    let config = test_config(&[
        ("ZONE_OUTPUT_DIR", output.to_str().unwrap()),
        ("NAMED_CHECKZONE_BIN", checkzone.to_str().unwrap()),
        ("RNDC_BIN", rndc.to_str().unwrap()),
        ("RNDC_SERVER", "10.0.0.53"),
        ("APPLY_STRATEGY", "zone"),
    ]);
    let controller = ZoneController::new(&config)
        .with_snapshot_provider(Box::new(StaticSnapshots(live_zone())))
        .with_clock(Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap());

    let plan = controller.plan_file(&desired, None, &vars()).await.unwrap();
    let outcome = controller.apply(&plan, true).await.unwrap();
    assert!(matches!(
        outcome,
        ApplyOutcome::Applied {
            strategy: ApplyStrategy::Zone,
            ..
        }
    ));

    let zone_file = output.join("example.com.zone");
    let text = std::fs::read_to_string(&zone_file).unwrap();
    assert!(text.starts_with("$ORIGIN example.com.\n$TTL 3600\n"));
    assert!(text.contains("    2026101701 ; serial\n"));
    assert!(text.contains("api 300 IN A 192.0.2.10\n"));
    assert!(text.contains("@ 3600 IN MX 10 mail.example.com.\n"));
    assert!(!text.contains("legacy"));

    let calls: Vec<String> = std::fs::read_to_string(&log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(
        calls,
        vec![
            format!("named-checkzone example.com. {}", zone_file.display()),
            "rndc -s 10.0.0.53 reload example.com. default".to_string(),
        ]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_checkzone_blocks_reload() {
    let dir = tempfile::tempdir().unwrap();
    let desired = write_desired(dir.path(), "example.com.yaml", DESIRED);
    let log = dir.path().join("tools.log");
    let checkzone = common::fake_tool(dir.path(), "named-checkzone", &log, 1);
    let rndc = common::fake_tool(dir.path(), "rndc", &log, 0);
    let config = test_config(&[
        ("ZONE_OUTPUT_DIR", dir.path().join("zones").to_str().unwrap()),
        ("NAMED_CHECKZONE_BIN", checkzone.to_str().unwrap()),
        ("RNDC_BIN", rndc.to_str().unwrap()),
        ("APPLY_STRATEGY", "zone"),
    ]);
    let controller = ZoneController::new(&config)
        .with_snapshot_provider(Box::new(StaticSnapshots(live_zone())));

    let plan = controller.plan_file(&desired, None, &vars()).await.unwrap();
    let err = controller.apply(&plan, true).await.unwrap_err();

    assert_eq!(err.reason(), "CommandFailed");
    let log = std::fs::read_to_string(&log).unwrap();
    assert!(log.contains("named-checkzone"));
    assert!(!log.contains("rndc"));
}

#[tokio::test]
async fn test_declined_apply_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let desired = write_desired(dir.path(), "example.com.yaml", DESIRED);
    let output = dir.path().join("zones");
    let config = test_config(&[("ZONE_OUTPUT_DIR", output.to_str().unwrap())]);
    let sender = RecordingSender::default();
    let controller = ZoneController::new(&config)
        .with_snapshot_provider(Box::new(StaticSnapshots(live_zone())))
        .with_update_sender(Box::new(sender.clone()))
        .with_confirmer(Box::new(Decline));

    let plan = controller.plan_file(&desired, None, &vars()).await.unwrap();
    let outcome = controller.apply(&plan, false).await.unwrap();

    assert_eq!(outcome, ApplyOutcome::Aborted);
    assert!(!output.exists());
    assert!(sender.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_pulled_zone_replans_clean() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&[]);
    let controller = ZoneController::new(&config)
        .with_snapshot_provider(Box::new(StaticSnapshots(live_zone())));

    for (format, file) in [
        (ExportFormat::Yaml, "pulled.yaml"),
        (ExportFormat::Json, "pulled.json"),
    ] {
        let (state, soa) = controller.pull("example.com.").await.unwrap();
        let text = ZoneExport::new(&state, soa).render(format).unwrap();
        let path = write_desired(dir.path(), file, &text);

        let plan = controller
            .plan_file(&path, None, &HashMap::new())
            .await
            .unwrap();
        assert!(!plan.diff.has_changes(), "{format:?}: {:?}", plan.diff);
    }
}

#[tokio::test]
#[ignore = "requires a BIND server with AXFR and TSIG"]
async fn test_live_pull() {
    let Some(config) = common::live_config_or_skip() else {
        return;
    };
    let zone = std::env::var("BINDSYNC_TEST_ZONE").unwrap_or_else(|_| "example.com.".to_string());

    let (state, soa) = ZoneController::new(&config).pull(&zone).await.unwrap();

    assert!(soa.is_some(), "live zone {zone} has no SOA");
    println!("Pulled {} records from {}", state.records.len(), config.server_address());
}
