// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Live zone snapshots via AXFR.

use async_trait::async_trait;
use hickory_client::client::{Client, SyncClient};
use hickory_client::op::ResponseCode;
use hickory_client::rr::{Name, RecordType};
use hickory_client::tcp::TcpClientConnection;
use std::net::ToSocketAddrs;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::FetchError;
use crate::rdata::record_from_hickory;
use crate::record::ensure_absolute;
use crate::tsig::{create_tsig_signer, TsigKey};
use crate::zone::ZoneState;

/// Source of the current state of a zone.
#[async_trait]
pub trait ZoneSnapshotProvider: Send + Sync {
    /// Fetch every record of `zone`, including exactly one SOA.
    async fn fetch(&self, zone: &str) -> Result<ZoneState, FetchError>;
}

/// Fetches zones with a TSIG-signed AXFR over TCP.
#[derive(Debug, Clone)]
pub struct AxfrSnapshotProvider {
    server: String,
    key: TsigKey,
    timeout: Duration,
}

impl AxfrSnapshotProvider {
    #[must_use]
    pub fn new(server: impl Into<String>, key: TsigKey, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            key,
            timeout,
        }
    }
}

enum TransferOutcome {
    Records(Vec<hickory_client::rr::Record>),
    Refused(ResponseCode),
}

#[async_trait]
impl ZoneSnapshotProvider for AxfrSnapshotProvider {
    async fn fetch(&self, zone: &str) -> Result<ZoneState, FetchError> {
        let origin = ensure_absolute(zone);
        let failed = |reason: String| FetchError::TransferFailed {
            zone: origin.clone(),
            server: self.server.clone(),
            reason,
        };

        let zone_str = origin.clone();
        let server_str = self.server.clone();
        let key = self.key.clone();
        let timeout = self.timeout;

        let task = tokio::task::spawn_blocking(move || -> anyhow::Result<TransferOutcome> {
            let server_addr = server_str
                .to_socket_addrs()?
                .next()
                .ok_or_else(|| anyhow::anyhow!("Invalid server address: {server_str}"))?;
            let conn = TcpClientConnection::with_timeout(server_addr, timeout)?;
            let signer = create_tsig_signer(&key)?;
            let client = SyncClient::with_tsigner(conn, signer);

            let name = Name::from_str(&zone_str)?;
            let mut records = Vec::new();
            for response in client.zone_transfer(&name, None)? {
                let response = response?;
                if response.response_code() != ResponseCode::NoError {
                    return Ok(TransferOutcome::Refused(response.response_code()));
                }
                records.extend(response.answers().iter().cloned());
            }
            Ok(TransferOutcome::Records(records))
        });

        let outcome = tokio::time::timeout(timeout, task)
            .await
            .map_err(|_| FetchError::TransferTimeout {
                zone: origin.clone(),
                server: self.server.clone(),
                timeout_secs: timeout.as_secs().max(1),
            })?
            .map_err(|e| failed(format!("transfer task failed: {e}")))?
            .map_err(|e| failed(e.to_string()))?;

        let raw = match outcome {
            TransferOutcome::Records(raw) => raw,
            TransferOutcome::Refused(code) => {
                return Err(FetchError::TransferRefused {
                    zone: origin.clone(),
                    server: self.server.clone(),
                    rcode: code.to_string(),
                })
            }
        };

        let state = snapshot_from_records(&origin, &raw);
        if state.find_soa().is_none() {
            return Err(FetchError::MissingSoa {
                zone: origin.clone(),
                server: self.server.clone(),
            });
        }

        info!(
            "Transferred {} records for {} from {}",
            state.records.len(),
            origin,
            self.server
        );
        Ok(state)
    }
}

/// Build a zone state from transferred records.
///
/// AXFR ends with a repeat of the opening SOA; only the first SOA is kept.
#[must_use]
pub fn snapshot_from_records(origin: &str, raw: &[hickory_client::rr::Record]) -> ZoneState {
    let mut seen_soa = false;
    let mut records = Vec::with_capacity(raw.len());

    for rr in raw {
        if rr.record_type() == RecordType::SOA {
            if seen_soa {
                continue;
            }
            seen_soa = true;
        }
        match record_from_hickory(rr) {
            Some(record) => records.push(record),
            None => debug!("Skipping {} record without data at {}", rr.record_type(), rr.name()),
        }
    }

    let default_ttl = records.iter().find(|r| r.is_soa()).map(|soa| soa.ttl);
    let mut state = ZoneState::new(origin).with_records(records);
    state.default_ttl = default_ttl;
    state
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod transfer_tests;
