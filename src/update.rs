// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Dynamic DNS updates (RFC 2136).
//!
//! A [`ZoneDiff`] becomes an ordered list of [`UpdateOperation`]s:
//!
//! 1. delete every removed record
//! 2. delete the current side of every TTL change
//! 3. add every added record
//! 4. add the desired side of every TTL change
//!
//! All operations travel in a single UPDATE message, so the server applies
//! them atomically. Deletes remove one RR by rdata (class `NONE`, TTL 0) and
//! never touch other values at the same owner and type.

use async_trait::async_trait;
use hickory_client::client::{Client, SyncClient};
use hickory_client::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_client::rr::{DNSClass, Name, Record as DnsRecord, RecordType};
use hickory_client::tcp::TcpClientConnection;
use std::fmt;
use std::net::ToSocketAddrs;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::diff::ZoneDiff;
use crate::errors::{ApplyError, ValidationError};
use crate::rdata::record_to_hickory;
use crate::record::Record;
use crate::tsig::{create_tsig_signer, TsigKey};

/// One step of a dynamic update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOperation {
    /// Remove exactly this RR (matched by owner, type and rdata)
    Delete(Record),
    /// Add this RR with its TTL
    Add(Record),
}

impl UpdateOperation {
    /// The record this operation carries.
    #[must_use]
    pub fn record(&self) -> &Record {
        match self {
            Self::Delete(record) | Self::Add(record) => record,
        }
    }

    /// `"delete"` or `"add"`.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::Delete(_) => "delete",
            Self::Add(_) => "add",
        }
    }

    /// Hickory record for the update section.
    ///
    /// Deletes use class `NONE` and TTL 0 (RFC 2136 section 2.5.4).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the record cannot be encoded.
    pub fn to_hickory(&self) -> Result<DnsRecord, ValidationError> {
        let mut rr = record_to_hickory(self.record())?;
        if let Self::Delete(_) = self {
            rr.set_dns_class(DNSClass::NONE);
            rr.set_ttl(0);
        }
        Ok(rr)
    }
}

/// nsupdate syntax, e.g. `update add www.example.com. 300 A 192.0.2.1`.
impl fmt::Display for UpdateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record();
        match self {
            Self::Delete(_) => write!(
                f,
                "update delete {} {} {}",
                record.canonical_name(),
                record.canonical_type(),
                record.presentation_value()
            ),
            Self::Add(_) => write!(
                f,
                "update add {} {} {} {}",
                record.canonical_name(),
                record.ttl,
                record.canonical_type(),
                record.presentation_value()
            ),
        }
    }
}

/// Build the ordered operations for `diff`.
#[must_use]
pub fn build_update_operations(diff: &ZoneDiff) -> Vec<UpdateOperation> {
    let removals = diff.removed.iter().cloned().map(UpdateOperation::Delete);
    let ttl_deletes = diff
        .ttl_changed
        .iter()
        .map(|(current, _)| UpdateOperation::Delete(current.clone()));
    let additions = diff.added.iter().cloned().map(UpdateOperation::Add);
    let ttl_adds = diff
        .ttl_changed
        .iter()
        .map(|(_, desired)| UpdateOperation::Add(desired.clone()));

    removals
        .chain(ttl_deletes)
        .chain(additions)
        .chain(ttl_adds)
        .collect()
}

/// Check that every operation can be encoded as a DNS update.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_operations(operations: &[UpdateOperation]) -> Result<(), ValidationError> {
    operations
        .iter()
        .try_for_each(|operation| operation.to_hickory().map(|_| ()))
}

/// Render operations as an nsupdate script for the given zone.
///
/// Logged before each update is sent, so a batch can be replayed by hand.
#[must_use]
pub fn to_nsupdate_script(origin: &str, operations: &[UpdateOperation]) -> String {
    let mut script = format!("zone {origin}\n");
    for operation in operations {
        script.push_str(&operation.to_string());
        script.push('\n');
    }
    script.push_str("send\n");
    script
}

/// Delivers a batch of update operations for one zone.
#[async_trait]
pub trait UpdateSender: Send + Sync {
    /// Send `operations` in order as one update and return the response code.
    async fn send(
        &self,
        origin: &str,
        operations: &[UpdateOperation],
    ) -> Result<ResponseCode, ApplyError>;
}

/// Sends TSIG-signed UPDATE messages over TCP with hickory.
#[derive(Debug, Clone)]
pub struct DnsUpdateSender {
    server: String,
    key: TsigKey,
    timeout: Duration,
}

impl DnsUpdateSender {
    #[must_use]
    pub fn new(server: impl Into<String>, key: TsigKey, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            key,
            timeout,
        }
    }
}

#[async_trait]
impl UpdateSender for DnsUpdateSender {
    async fn send(
        &self,
        origin: &str,
        operations: &[UpdateOperation],
    ) -> Result<ResponseCode, ApplyError> {
        let records = operations
            .iter()
            .map(UpdateOperation::to_hickory)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApplyError::InvalidUpdate {
                zone: origin.to_string(),
                reason: e.to_string(),
            })?;

        debug!(
            "Update batch for {}:\n{}",
            origin,
            to_nsupdate_script(origin, operations)
        );

        let zone_str = origin.to_string();
        let server_str = self.server.clone();
        let key = self.key.clone();
        let timeout = self.timeout;

        let result = tokio::task::spawn_blocking(move || -> anyhow::Result<ResponseCode> {
            let server_addr = server_str
                .to_socket_addrs()?
                .next()
                .ok_or_else(|| anyhow::anyhow!("Invalid server address: {server_str}"))?;
            let conn = TcpClientConnection::with_timeout(server_addr, timeout)?;
            let signer = create_tsig_signer(&key)?;
            let client = SyncClient::with_tsigner(conn, signer);

            let zone = Name::from_str(&zone_str)?;
            let mut zone_query = Query::query(zone, RecordType::SOA);
            zone_query.set_query_class(DNSClass::IN);

            let mut message = Message::new();
            message
                .set_id(rand::random::<u16>())
                .set_message_type(MessageType::Query)
                .set_op_code(OpCode::Update)
                .set_recursion_desired(false);
            // The question section is the zone section, authority is the update section
            message.add_query(zone_query);
            for record in records {
                message.add_name_server(record);
            }

            let response = client
                .send(message)
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("No response received"))??;

            Ok(response.response_code())
        })
        .await
        .map_err(|e| ApplyError::UpdateFailed {
            zone: origin.to_string(),
            server: self.server.clone(),
            reason: format!("update task failed: {e}"),
        })?;

        let code = result.map_err(|e| ApplyError::UpdateFailed {
            zone: origin.to_string(),
            server: self.server.clone(),
            reason: e.to_string(),
        })?;

        info!(
            "Sent {} update operations for {} to {}: {}",
            operations.len(),
            origin,
            self.server,
            code
        );
        Ok(code)
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod update_tests;
